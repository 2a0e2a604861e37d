use std::fmt;

/// Selects how a [`ParamList`] is rendered for instructions that support both
/// Dockerfile forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunForm {
    /// `["a", "b"]`, the exec form.
    Array,
    /// `a b`, the shell form.
    Plain,
}

impl RunForm {
    /// Maps the document tags `exec` and `shell`. Anything else is `None`,
    /// which leaves the instruction on its default form.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "exec" => Some(Self::Array),
            "shell" => Some(Self::Plain),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParamList(Vec<String>);

impl ParamList {
    pub fn new(params: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(params.into_iter().map(Into::into).collect())
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn array_form(&self) -> String {
        let quoted: Vec<String> = self.0.iter().map(|param| format!("\"{param}\"")).collect();
        format!("[{}]", quoted.join(", "))
    }

    pub fn plain_form(&self) -> String {
        self.0.join(" ")
    }

    pub fn render(&self, form: RunForm) -> String {
        match form {
            RunForm::Array => self.array_form(),
            RunForm::Plain => self.plain_form(),
        }
    }
}

impl From<Vec<String>> for ParamList {
    fn from(value: Vec<String>) -> Self {
        Self(value)
    }
}

impl<S: Into<String>> FromIterator<S> for ParamList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BaseImage {
    pub image: String,
    pub alias: String,
}

impl BaseImage {
    pub fn new(image: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            alias: alias.into(),
        }
    }

    pub fn render(&self) -> String {
        if self.alias.is_empty() {
            format!("FROM {}", self.image)
        } else {
            format!("FROM {} as {}", self.image, self.alias)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildArg {
    pub name: String,
    pub value: String,
    /// Adds a `RUN test -n` guard so the build fails on an empty value.
    pub require_non_empty: bool,
    /// Re-exports the argument as an environment variable of the same name.
    pub export_as_env: bool,
}

impl BuildArg {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            require_non_empty: false,
            export_as_env: false,
        }
    }

    pub fn require_non_empty(mut self, enabled: bool) -> Self {
        self.require_non_empty = enabled;
        self
    }

    pub fn export_as_env(mut self, enabled: bool) -> Self {
        self.export_as_env = enabled;
        self
    }

    pub fn render(&self) -> String {
        let mut out = format!("ARG {}", self.name);
        if !self.value.is_empty() {
            out.push('=');
            out.push_str(&self.value);
        }
        if self.require_non_empty {
            out.push_str(&format!("\nRUN test -n \"${{{}}}\"", self.name));
        }
        if self.export_as_env {
            out.push_str(&format!("\nENV {0}=\"${{{0}}}\"", self.name));
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Label {
    pub name: String,
    pub value: String,
}

impl Label {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn render(&self) -> String {
        format!("LABEL {}={}", self.name, self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Volume {
    pub source: String,
    pub destination: String,
}

impl Volume {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }

    pub fn render(&self) -> String {
        format!("VOLUME {} {}", self.source, self.destination)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunCommand {
    pub params: ParamList,
    pub form: Option<RunForm>,
}

impl RunCommand {
    pub const DEFAULT_FORM: RunForm = RunForm::Plain;

    pub fn new(params: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            params: ParamList::new(params),
            form: None,
        }
    }

    pub fn with_form(mut self, form: RunForm) -> Self {
        self.form = Some(form);
        self
    }

    pub fn render(&self) -> String {
        let form = self.form.unwrap_or(Self::DEFAULT_FORM);
        format!("RUN {}", self.params.render(form))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn render(&self) -> String {
        format!("ENV {}={}", self.name, self.value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CopyCommand {
    pub sources: Vec<String>,
    pub destination: String,
    /// Rendered as `--chown=<owner>`.
    pub owner: String,
    /// Rendered as `--from=<stage>`.
    pub from_stage: String,
}

impl CopyCommand {
    pub fn new(
        sources: impl IntoIterator<Item = impl Into<String>>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            sources: sources.into_iter().map(Into::into).collect(),
            destination: destination.into(),
            owner: String::new(),
            from_stage: String::new(),
        }
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = owner.into();
        self
    }

    pub fn with_from_stage(mut self, stage: impl Into<String>) -> Self {
        self.from_stage = stage.into();
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::from("COPY");
        if !self.from_stage.is_empty() {
            out.push_str(" --from=");
            out.push_str(&self.from_stage);
        }
        if !self.owner.is_empty() {
            out.push_str(" --chown=");
            out.push_str(&self.owner);
        }
        format!("{out} {} {}", self.sources.join(" "), self.destination)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Cmd {
    pub params: ParamList,
    pub form: Option<RunForm>,
}

impl Cmd {
    pub const DEFAULT_FORM: RunForm = RunForm::Array;

    pub fn new(params: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            params: ParamList::new(params),
            form: None,
        }
    }

    pub fn with_form(mut self, form: RunForm) -> Self {
        self.form = Some(form);
        self
    }

    pub fn render(&self) -> String {
        let form = self.form.unwrap_or(Self::DEFAULT_FORM);
        format!("CMD {}", self.params.render(form))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Entrypoint {
    pub params: ParamList,
    pub form: Option<RunForm>,
}

impl Entrypoint {
    pub const DEFAULT_FORM: RunForm = RunForm::Array;

    pub fn new(params: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            params: ParamList::new(params),
            form: None,
        }
    }

    pub fn with_form(mut self, form: RunForm) -> Self {
        self.form = Some(form);
        self
    }

    pub fn render(&self) -> String {
        let form = self.form.unwrap_or(Self::DEFAULT_FORM);
        format!("ENTRYPOINT {}", self.params.render(form))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OnBuild {
    pub params: ParamList,
}

impl OnBuild {
    pub fn new(params: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            params: ParamList::new(params),
        }
    }

    pub fn render(&self) -> String {
        format!("ONBUILD {}", self.params.plain_form())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HealthCheck {
    pub params: ParamList,
}

impl HealthCheck {
    pub fn new(params: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            params: ParamList::new(params),
        }
    }

    pub fn render(&self) -> String {
        format!("HEALTHCHECK {}", self.params.plain_form())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Shell {
    pub params: ParamList,
}

impl Shell {
    pub fn new(params: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            params: ParamList::new(params),
        }
    }

    pub fn render(&self) -> String {
        format!("SHELL {}", self.params.array_form())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Workdir {
    pub dir: String,
}

impl Workdir {
    pub fn new(dir: impl Into<String>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn render(&self) -> String {
        format!("WORKDIR {}", self.dir)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct User {
    pub user: String,
    pub group: String,
}

impl User {
    pub fn new(user: impl Into<String>, group: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            group: group.into(),
        }
    }

    pub fn named(user: impl Into<String>) -> Self {
        Self::new(user, "")
    }

    /// Empty when both parts are empty; the renderer then drops the line.
    pub fn render(&self) -> String {
        match (self.user.is_empty(), self.group.is_empty()) {
            (true, true) => String::new(),
            (_, true) => format!("USER {}", self.user),
            _ => format!("USER {}:{}", self.user, self.group),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    BaseImage(BaseImage),
    BuildArg(BuildArg),
    Label(Label),
    Volume(Volume),
    RunCommand(RunCommand),
    EnvVar(EnvVar),
    Copy(CopyCommand),
    Cmd(Cmd),
    Entrypoint(Entrypoint),
    OnBuild(OnBuild),
    HealthCheck(HealthCheck),
    Shell(Shell),
    Workdir(Workdir),
    User(User),
}

impl Instruction {
    pub fn render(&self) -> String {
        match self {
            Self::BaseImage(inner) => inner.render(),
            Self::BuildArg(inner) => inner.render(),
            Self::Label(inner) => inner.render(),
            Self::Volume(inner) => inner.render(),
            Self::RunCommand(inner) => inner.render(),
            Self::EnvVar(inner) => inner.render(),
            Self::Copy(inner) => inner.render(),
            Self::Cmd(inner) => inner.render(),
            Self::Entrypoint(inner) => inner.render(),
            Self::OnBuild(inner) => inner.render(),
            Self::HealthCheck(inner) => inner.render(),
            Self::Shell(inner) => inner.render(),
            Self::Workdir(inner) => inner.render(),
            Self::User(inner) => inner.render(),
        }
    }

    pub const fn keyword(&self) -> &'static str {
        match self {
            Self::BaseImage(_) => "FROM",
            Self::BuildArg(_) => "ARG",
            Self::Label(_) => "LABEL",
            Self::Volume(_) => "VOLUME",
            Self::RunCommand(_) => "RUN",
            Self::EnvVar(_) => "ENV",
            Self::Copy(_) => "COPY",
            Self::Cmd(_) => "CMD",
            Self::Entrypoint(_) => "ENTRYPOINT",
            Self::OnBuild(_) => "ONBUILD",
            Self::HealthCheck(_) => "HEALTHCHECK",
            Self::Shell(_) => "SHELL",
            Self::Workdir(_) => "WORKDIR",
            Self::User(_) => "USER",
        }
    }
}

macro_rules! instruction_from {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        $(
            impl From<$ty> for Instruction {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

instruction_from!(
    BaseImage(BaseImage),
    BuildArg(BuildArg),
    Label(Label),
    Volume(Volume),
    RunCommand(RunCommand),
    EnvVar(EnvVar),
    Copy(CopyCommand),
    Cmd(Cmd),
    Entrypoint(Entrypoint),
    OnBuild(OnBuild),
    HealthCheck(HealthCheck),
    Shell(Shell),
    Workdir(Workdir),
    User(User),
);

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Stage {
    /// Key the stage was declared under, when decoded from a document.
    pub name: Option<String>,
    pub instructions: Vec<Instruction>,
}

impl Stage {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self {
            name: None,
            instructions,
        }
    }

    pub fn named(name: impl Into<String>, instructions: Vec<Instruction>) -> Self {
        Self {
            name: Some(name.into()),
            instructions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildFile {
    pub stages: Vec<Stage>,
}

impl BuildFile {
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    pub fn instruction_count(&self) -> usize {
        self.stages
            .iter()
            .map(|stage| stage.instructions.len())
            .sum()
    }
}

impl fmt::Display for BuildFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::render::render_build_file(self))
    }
}

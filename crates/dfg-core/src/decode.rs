//! Decodes YAML documents into a [`BuildFile`].
//!
//! The document (or the node a path expression selects inside it) must hold a
//! `stages` mapping from stage name to a sequence of single-key instruction
//! mappings:
//!
//! ```yaml
//! stages:
//!   builder:
//!     - from: {image: "golang:1.7.3", as: builder}
//!     - run: {params: [go, build, .]}
//!   final:
//!     - from: {image: alpine}
//!     - user: app
//! ```
//!
//! Stage order is taken from the source order of the `stages` keys, never from
//! the iteration order of the decoded name → stage map.

use std::collections::BTreeMap;
use std::io::Read;

use serde_yaml::{Mapping, Value};
use tracing::{debug, trace};

use crate::error::Error;
use crate::model::{
    BaseImage, BuildArg, BuildFile, Cmd, CopyCommand, Entrypoint, EnvVar, HealthCheck,
    Instruction, Label, OnBuild, RunCommand, RunForm, Shell, Stage, User, Volume, Workdir,
};
use crate::path::Path;
use crate::value::{is_truthy, kind, render_scalar, render_scalar_array};

const STAGES_KEY: &str = "stages";
/// Stands in for the file name when a document comes from a stream.
const READER_SOURCE: &str = "<stream>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionKind {
    From,
    Arg,
    Label,
    Volume,
    Run,
    EnvVariable,
    Copy,
    Cmd,
    Entrypoint,
    OnBuild,
    HealthCheck,
    Shell,
    Workdir,
    User,
}

/// How the value under an instruction key is laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// A mapping of scalar fields.
    Fields,
    /// A mapping carrying a required sequence field (`params` or `sources`).
    List,
    /// A mapping of scalar fields, or a bare string.
    FieldsOrString,
}

/// Lowercased instruction keys. Lookup lowercases the document key first.
const KIND_TABLE: &[(&str, InstructionKind)] = &[
    ("from", InstructionKind::From),
    ("arg", InstructionKind::Arg),
    ("label", InstructionKind::Label),
    ("volume", InstructionKind::Volume),
    ("run", InstructionKind::Run),
    ("envvariable", InstructionKind::EnvVariable),
    ("copy", InstructionKind::Copy),
    ("cmd", InstructionKind::Cmd),
    ("entrypoint", InstructionKind::Entrypoint),
    ("onbuild", InstructionKind::OnBuild),
    ("healthcheck", InstructionKind::HealthCheck),
    ("shell", InstructionKind::Shell),
    ("workdir", InstructionKind::Workdir),
    ("user", InstructionKind::User),
];

impl InstructionKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.to_ascii_lowercase();
        KIND_TABLE
            .iter()
            .find(|(candidate, _)| *candidate == tag)
            .map(|(_, kind)| *kind)
    }

    /// Canonical document spelling.
    pub const fn tag(self) -> &'static str {
        match self {
            Self::From => "from",
            Self::Arg => "arg",
            Self::Label => "label",
            Self::Volume => "volume",
            Self::Run => "run",
            Self::EnvVariable => "envVariable",
            Self::Copy => "copy",
            Self::Cmd => "cmd",
            Self::Entrypoint => "entrypoint",
            Self::OnBuild => "onbuild",
            Self::HealthCheck => "healthCheck",
            Self::Shell => "shell",
            Self::Workdir => "workdir",
            Self::User => "user",
        }
    }

    pub const fn shape(self) -> Shape {
        match self {
            Self::From
            | Self::Arg
            | Self::Label
            | Self::Volume
            | Self::EnvVariable
            | Self::Workdir => Shape::Fields,
            Self::Run
            | Self::Copy
            | Self::Cmd
            | Self::Entrypoint
            | Self::OnBuild
            | Self::HealthCheck
            | Self::Shell => Shape::List,
            Self::User => Shape::FieldsOrString,
        }
    }

    fn decode(self, body: &Value, site: Site<'_>) -> Result<Instruction, Error> {
        let mapping = match (self.shape(), body) {
            (_, Value::Mapping(mapping)) => mapping,
            (Shape::FieldsOrString, other) => {
                return match render_scalar(other) {
                    Some(user) if !other.is_null() => Ok(User::named(user).into()),
                    _ => Err(site.error(format!(
                        "expected a mapping or a scalar, found {}",
                        kind(other)
                    ))),
                };
            }
            (_, other) => {
                return Err(site.error(format!("expected a mapping, found {}", kind(other))));
            }
        };
        let fields = Fields { mapping, site };

        let instruction: Instruction = match self {
            Self::From => BaseImage::new(fields.string("image")?, fields.string("as")?).into(),
            Self::Arg => BuildArg::new(fields.string("name")?, fields.string("value")?)
                .require_non_empty(fields.flag("test"))
                .export_as_env(fields.flag("envVariable"))
                .into(),
            Self::Label => Label::new(fields.string("name")?, fields.string("value")?).into(),
            Self::Volume => {
                Volume::new(fields.string("source")?, fields.string("destination")?).into()
            }
            Self::Run => RunCommand {
                params: fields.list("params")?.into(),
                form: fields.run_form(),
            }
            .into(),
            Self::EnvVariable => EnvVar::new(fields.string("name")?, fields.string("value")?).into(),
            Self::Copy => CopyCommand::new(fields.list("sources")?, fields.string("destination")?)
                .with_owner(fields.string("chown")?)
                .with_from_stage(fields.string("from")?)
                .into(),
            Self::Cmd => Cmd {
                params: fields.list("params")?.into(),
                form: fields.run_form(),
            }
            .into(),
            Self::Entrypoint => Entrypoint {
                params: fields.list("params")?.into(),
                form: fields.run_form(),
            }
            .into(),
            Self::OnBuild => OnBuild::new(fields.list("params")?).into(),
            Self::HealthCheck => HealthCheck::new(fields.list("params")?).into(),
            Self::Shell => Shell::new(fields.list("params")?).into(),
            Self::Workdir => Workdir::new(fields.string("dir")?).into(),
            Self::User => User::new(fields.string("user")?, fields.string("group")?).into(),
        };

        Ok(instruction)
    }
}

/// Where an instruction sits in the document, for error reporting.
#[derive(Clone, Copy)]
struct Site<'a> {
    stage: &'a str,
    index: usize,
    kind: InstructionKind,
}

impl Site<'_> {
    fn error(&self, msg: impl Into<String>) -> Error {
        Error::malformed_instruction(self.stage, self.index, self.kind.tag(), msg)
    }
}

struct Fields<'a> {
    mapping: &'a Mapping,
    site: Site<'a>,
}

impl Fields<'_> {
    /// Missing and null fields read as the empty string.
    fn string(&self, name: &str) -> Result<String, Error> {
        let Some(value) = self.mapping.get(name) else {
            return Ok(String::new());
        };
        render_scalar(value).ok_or_else(|| {
            self.site.error(format!(
                "field `{name}` expected a scalar, found {}",
                kind(value)
            ))
        })
    }

    fn flag(&self, name: &str) -> bool {
        self.mapping.get(name).is_some_and(is_truthy)
    }

    fn list(&self, name: &str) -> Result<Vec<String>, Error> {
        let value = self
            .mapping
            .get(name)
            .ok_or_else(|| self.site.error(format!("missing `{name}` sequence")))?;
        if let Some(items) = render_scalar_array(value) {
            return Ok(items);
        }

        let Value::Sequence(items) = value else {
            return Err(self.site.error(format!(
                "field `{name}` expected a sequence, found {}",
                kind(value)
            )));
        };
        let (position, item) = items
            .iter()
            .enumerate()
            .find(|(_, item)| render_scalar(item).is_none())
            .ok_or_else(|| self.site.error(format!("field `{name}` is not a scalar sequence")))?;
        Err(self.site.error(format!(
            "field `{name}[{position}]` expected a scalar, found {}",
            kind(item)
        )))
    }

    fn run_form(&self) -> Option<RunForm> {
        self.mapping
            .get("runForm")
            .and_then(render_scalar)
            .and_then(|tag| RunForm::from_tag(&tag))
    }
}

pub fn decode_str(input: &str) -> Result<BuildFile, Error> {
    let document: Value = serde_yaml::from_str(input)?;
    decode_value(&document)
}

pub fn decode_str_at(input: &str, path: &str) -> Result<BuildFile, Error> {
    let document: Value = serde_yaml::from_str(input)?;
    decode_value_at(&document, path)
}

pub fn decode_reader(reader: impl Read) -> Result<BuildFile, Error> {
    decode_str(&read_all(reader)?)
}

pub fn decode_reader_at(reader: impl Read, path: &str) -> Result<BuildFile, Error> {
    decode_str_at(&read_all(reader)?, path)
}

pub fn decode_file(file: impl AsRef<std::path::Path>) -> Result<BuildFile, Error> {
    decode_str(&read_document(file.as_ref())?)
}

pub fn decode_file_at(file: impl AsRef<std::path::Path>, path: &str) -> Result<BuildFile, Error> {
    decode_str_at(&read_document(file.as_ref())?, path)
}

pub fn decode_value(document: &Value) -> Result<BuildFile, Error> {
    decode_node(document)
}

pub fn decode_value_at(document: &Value, path: &str) -> Result<BuildFile, Error> {
    let path = Path::parse(path)?;
    let node = path.resolve(document)?;
    debug!(path = %path, node = kind(node), "resolved document path");
    decode_node(node)
}

/// Reads the whole stream up front so read failures stay distinct from parse
/// failures.
fn read_all(mut reader: impl Read) -> Result<String, Error> {
    let mut input = String::new();
    reader
        .read_to_string(&mut input)
        .map_err(|source| Error::document_read(READER_SOURCE, source))?;
    Ok(input)
}

fn read_document(file: &std::path::Path) -> Result<String, Error> {
    debug!(file = %file.display(), "reading document");
    std::fs::read_to_string(file).map_err(|source| Error::document_read(file, source))
}

fn decode_node(node: &Value) -> Result<BuildFile, Error> {
    let stages = stages_mapping(node)?;
    let order = stage_order(stages)?;
    let mut decoded = decode_stages(stages)?;

    let stages = order
        .iter()
        .map(|name| {
            decoded.remove(name).ok_or_else(|| {
                Error::malformed_stages(format!("stage \"{name}\" was declared but not decoded"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let build_file = BuildFile::new(stages);
    debug!(
        stages = build_file.stages.len(),
        instructions = build_file.instruction_count(),
        "decoded build file"
    );
    Ok(build_file)
}

fn stages_mapping(node: &Value) -> Result<&Mapping, Error> {
    let Value::Mapping(root) = node else {
        return Err(Error::malformed_stages(format!(
            "expected a mapping with a `{STAGES_KEY}` key, found {}",
            kind(node)
        )));
    };
    let stages = root
        .get(STAGES_KEY)
        .ok_or_else(|| Error::malformed_stages(format!("missing `{STAGES_KEY}` key")))?;
    match stages {
        Value::Mapping(stages) => Ok(stages),
        other => Err(Error::malformed_stages(format!(
            "expected `{STAGES_KEY}` to map stage names to instruction sequences, found {}",
            kind(other)
        ))),
    }
}

/// Stage names in source order, read from the ordered tree.
fn stage_order(stages: &Mapping) -> Result<Vec<String>, Error> {
    let mut order: Vec<String> = Vec::with_capacity(stages.len());
    for (key, value) in stages {
        let name = stage_name(key)?;
        if !matches!(value, Value::Sequence(_)) {
            return Err(Error::malformed_stages(format!(
                "stage \"{name}\" must be a sequence of instructions, found {}",
                kind(value)
            )));
        }
        if order.contains(&name) {
            return Err(Error::malformed_stages(format!(
                "stage \"{name}\" is declared more than once"
            )));
        }
        order.push(name);
    }
    Ok(order)
}

fn decode_stages(stages: &Mapping) -> Result<BTreeMap<String, Stage>, Error> {
    let mut decoded = BTreeMap::new();
    for (key, value) in stages {
        let name = stage_name(key)?;
        let Value::Sequence(items) = value else {
            continue;
        };

        let instructions = items
            .iter()
            .enumerate()
            .map(|(index, item)| decode_instruction(&name, index, item))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(stage = %name, instructions = instructions.len(), "decoded stage");

        decoded.insert(name.clone(), Stage::named(name, instructions));
    }
    Ok(decoded)
}

fn stage_name(key: &Value) -> Result<String, Error> {
    match key {
        Value::Null => Err(Error::malformed_stages("stage name must not be null")),
        key => render_scalar(key).ok_or_else(|| {
            Error::malformed_stages(format!(
                "stage name must be a scalar, found {}",
                kind(key)
            ))
        }),
    }
}

fn decode_instruction(stage: &str, index: usize, item: &Value) -> Result<Instruction, Error> {
    let Value::Mapping(entry) = item else {
        return Err(Error::malformed_instruction(
            stage,
            index,
            "instruction",
            format!("expected a single-key mapping, found {}", kind(item)),
        ));
    };
    let (tag, body) = match entry.iter().next() {
        Some(pair) if entry.len() == 1 => pair,
        _ => {
            return Err(Error::malformed_instruction(
                stage,
                index,
                "instruction",
                format!("expected a single-key mapping, found {} keys", entry.len()),
            ));
        }
    };

    let tag = render_scalar(tag).unwrap_or_else(|| kind(tag).to_string());
    let instruction_kind = InstructionKind::from_tag(&tag)
        .ok_or_else(|| Error::unknown_instruction(stage, index, tag.as_str()))?;
    trace!(stage, index, kind = instruction_kind.tag(), "decoding instruction");

    instruction_kind.decode(
        body,
        Site {
            stage,
            index,
            kind: instruction_kind,
        },
    )
}

use std::io::Write;

use tracing::debug;

use crate::decode;
use crate::error::Error;
use crate::model::BuildFile;
use crate::render::render_build_file;

/// Holds a [`BuildFile`] until it is rendered. The data is used as given; no
/// validation or defaulting happens here.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DockerfileTemplate {
    data: BuildFile,
}

impl DockerfileTemplate {
    pub fn new(data: BuildFile) -> Self {
        Self { data }
    }

    pub fn from_yaml_str(input: &str) -> Result<Self, Error> {
        decode::decode_str(input).map(Self::new)
    }

    pub fn from_yaml_str_at(input: &str, path: &str) -> Result<Self, Error> {
        decode::decode_str_at(input, path).map(Self::new)
    }

    pub fn from_yaml_file(file: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        decode::decode_file(file).map(Self::new)
    }

    pub fn from_yaml_file_at(file: impl AsRef<std::path::Path>, path: &str) -> Result<Self, Error> {
        decode::decode_file_at(file, path).map(Self::new)
    }

    pub fn data(&self) -> &BuildFile {
        &self.data
    }

    pub fn into_data(self) -> BuildFile {
        self.data
    }

    pub fn render_to_string(&self) -> String {
        render_build_file(&self.data)
    }

    pub fn render(&self, writer: &mut impl Write) -> Result<(), Error> {
        let text = self.render_to_string();
        debug!(
            stages = self.data.stages.len(),
            bytes = text.len(),
            "rendering dockerfile"
        );
        writer.write_all(text.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

impl From<BuildFile> for DockerfileTemplate {
    fn from(value: BuildFile) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use std::io::{self, Write};

    use crate::error::Error;
    use crate::model::{BaseImage, BuildFile, Stage, User};
    use crate::template::DockerfileTemplate;

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn renders_into_byte_sink() {
        let template = DockerfileTemplate::new(BuildFile::new(vec![Stage::new(vec![
            BaseImage::new("alpine", "").into(),
            User::named("app").into(),
        ])]));

        let mut out = Vec::new();
        template.render(&mut out).expect("render should succeed");
        assert_eq!(String::from_utf8(out).expect("utf-8"), "FROM alpine\nUSER app\n\n");
    }

    #[test]
    fn surfaces_sink_errors() {
        let template = DockerfileTemplate::new(BuildFile::new(vec![Stage::new(vec![
            BaseImage::new("alpine", "").into(),
        ])]));
        let error = template
            .render(&mut FailingWriter)
            .expect_err("write should fail");
        assert!(matches!(error, Error::Io { .. }));
    }

    #[test]
    fn decodes_from_yaml() {
        let template = DockerfileTemplate::from_yaml_str_at(
            "config:\n  stages:\n    a:\n      - from: {image: alpine, as: base}\n",
            ".config",
        )
        .expect("yaml should decode");
        assert_eq!(template.render_to_string(), "FROM alpine as base\n\n");
        assert_eq!(template.data().stages[0].name.as_deref(), Some("a"));
    }
}

//! Re-parses generated text with a Dockerfile parser as a sanity check on the
//! output.

use dockerfile_parser::Dockerfile;
use tracing::debug;

use crate::error::Error;
use crate::model::BuildFile;
use crate::render::render_build_file;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyReport {
    pub stages: Vec<VerifiedStage>,
    pub instructions: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedStage {
    pub index: usize,
    pub alias: Option<String>,
    pub instructions: usize,
}

pub fn verify_rendered(text: &str) -> Result<VerifyReport, Error> {
    let dockerfile = Dockerfile::parse(text).map_err(|err| Error::verify(format!("{err}")))?;

    let stages = dockerfile
        .stages()
        .iter()
        .map(|stage| VerifiedStage {
            index: stage.index,
            alias: stage
                .instructions
                .first()
                .and_then(|instruction| instruction.as_from())
                .and_then(|from| from.alias.as_ref())
                .map(|alias| alias.content.clone()),
            instructions: stage.instructions.len(),
        })
        .collect::<Vec<_>>();

    let report = VerifyReport {
        stages,
        instructions: dockerfile.instructions.len(),
    };
    debug!(
        stages = report.stages.len(),
        instructions = report.instructions,
        "verified rendered dockerfile"
    );
    Ok(report)
}

/// Renders `build_file` and checks that the parser sees one stage per
/// declared stage.
pub fn verify(build_file: &BuildFile) -> Result<VerifyReport, Error> {
    let report = verify_rendered(&render_build_file(build_file))?;
    if report.stages.len() != build_file.stages.len() {
        return Err(Error::verify(format!(
            "expected {} stages, parser found {}",
            build_file.stages.len(),
            report.stages.len()
        )));
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::model::{
        BaseImage, BuildArg, BuildFile, Cmd, CopyCommand, RunCommand, Stage, Workdir,
    };
    use crate::verify::verify;

    #[test]
    fn reports_stages_and_aliases() {
        let build_file = BuildFile::new(vec![
            Stage::new(vec![
                BaseImage::new("golang:1.7.3", "builder").into(),
                Workdir::new("/go/src/app/").into(),
                RunCommand::new(["go", "build", "."]).into(),
            ]),
            Stage::new(vec![
                BaseImage::new("alpine:latest", "").into(),
                CopyCommand::new(["/go/src/app/app"], ".")
                    .with_from_stage("builder")
                    .into(),
                Cmd::new(["./app"]).into(),
            ]),
        ]);

        let report = verify(&build_file).expect("output should parse");
        assert_eq!(report.stages.len(), 2);
        assert_eq!(report.stages[0].alias.as_deref(), Some("builder"));
        assert_eq!(report.stages[0].instructions, 3);
        assert_eq!(report.stages[1].alias, None);
        assert_eq!(report.instructions, 6);
    }

    #[test]
    fn counts_expanded_arg_lines() {
        let build_file = BuildFile::new(vec![Stage::new(vec![
            BaseImage::new("alpine", "").into(),
            BuildArg::new("X", "1")
                .require_non_empty(true)
                .export_as_env(true)
                .into(),
        ])]);
        let report = verify(&build_file).expect("output should parse");
        assert_eq!(report.instructions, 4);
    }

    #[test]
    fn rejects_stage_without_from() {
        let build_file = BuildFile::new(vec![
            Stage::new(vec![BaseImage::new("alpine", "").into()]),
            Stage::new(vec![Workdir::new("/app").into()]),
        ]);
        let error = verify(&build_file).expect_err("second stage has no FROM");
        assert!(matches!(error, Error::Verify { .. }));
    }
}

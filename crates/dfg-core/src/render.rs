use crate::model::{BuildFile, Stage};

/// Renders instructions one per line, ending every stage with a blank line.
/// Instructions that render to nothing (an empty `USER`) contribute no line.
pub fn render_build_file(build_file: &BuildFile) -> String {
    let mut out = String::new();
    for stage in &build_file.stages {
        out.push_str(&render_stage(stage));
        out.push_str("\n\n");
    }
    out
}

pub fn render_stage(stage: &Stage) -> String {
    stage
        .instructions
        .iter()
        .map(|instruction| instruction.render())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

pub mod decode;
pub mod error;
pub mod exit_code;
pub mod model;
pub mod path;
pub mod render;
pub mod template;
pub mod value;
pub mod verify;

pub use crate::decode::{InstructionKind, decode_file, decode_file_at, decode_str, decode_str_at};
pub use crate::error::{Error, Span};
pub use crate::exit_code::ExitCode;
pub use crate::model::{
    BaseImage, BuildArg, BuildFile, Cmd, CopyCommand, Entrypoint, EnvVar, HealthCheck,
    Instruction, Label, OnBuild, ParamList, RunCommand, RunForm, Shell, Stage, User, Volume,
    Workdir,
};
pub use crate::path::Path;
pub use crate::template::DockerfileTemplate;
pub use crate::verify::{VerifyReport, verify};

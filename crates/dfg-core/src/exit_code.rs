use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    Path = 2,
    Instruction = 3,
    Stages = 4,
    Document = 5,
    Io = 6,
    Verify = 7,
    Usage = 64,
}

impl ExitCode {
    pub const fn as_i32(self) -> i32 {
        self as i32
    }
}

impl From<&Error> for ExitCode {
    fn from(value: &Error) -> Self {
        match value {
            Error::PathNotFound { .. }
            | Error::InvalidPath { .. }
            | Error::IndexOutOfRange { .. } => Self::Path,
            Error::UnknownInstructionKind { .. } | Error::MalformedInstructionShape { .. } => {
                Self::Instruction
            }
            Error::MalformedStagesStructure { .. } => Self::Stages,
            Error::DocumentRead { .. } | Error::DocumentParse { .. } => Self::Document,
            Error::Io { .. } => Self::Io,
            Error::Verify { .. } => Self::Verify,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::error::Error;
    use crate::exit_code::ExitCode;

    #[test]
    fn maps_error_variants_to_exit_codes() {
        assert_eq!(
            ExitCode::from(&Error::path_not_found(".dev", ".dev")),
            ExitCode::Path
        );
        assert_eq!(
            ExitCode::from(&Error::index_out_of_range(".a[3]", 3, 1)),
            ExitCode::Path
        );
        assert_eq!(
            ExitCode::from(&Error::unknown_instruction("final", 0, "expose")),
            ExitCode::Instruction
        );
        assert_eq!(
            ExitCode::from(&Error::malformed_stages("missing stages")),
            ExitCode::Stages
        );
        assert_eq!(
            ExitCode::from(&Error::document_read(
                "missing.yaml",
                std::io::Error::from(std::io::ErrorKind::NotFound)
            )),
            ExitCode::Document
        );
        assert_eq!(
            ExitCode::from(&Error::io(std::io::Error::from(std::io::ErrorKind::Other))),
            ExitCode::Io
        );
        assert_eq!(ExitCode::from(&Error::verify("no FROM")), ExitCode::Verify);
    }
}

//! CLI Exit Code Registry
//!
//! Single source of truth for `clientsync` exit codes. Scripts rely on them.
//!
//! | Code | Meaning                                          |
//! |------|--------------------------------------------------|
//! | 0    | Success                                          |
//! | 1    | General error (unspecified)                      |
//! | 2    | Usage error (bad args, invalid config)           |
//! | 3    | Input could not be read or mapped                |
//! | 4    | Output could not be written                      |
//! | 5    | Duplicate identity numbers in the roster         |
//! | 6    | Run finished with rejected records (opt-in)      |

use clientsync_recon::ReconError;

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, invalid or unreadable config.
pub const EXIT_USAGE: u8 = 2;

/// Input file missing, unreadable, or lacking a required column.
pub const EXIT_INPUT: u8 = 3;

/// Feed, report, or roster could not be written.
pub const EXIT_OUTPUT: u8 = 4;

/// Roster has two rows with the same normalized identity number.
pub const EXIT_DUPLICATE: u8 = 5;

/// `--fail-on-rejected` and at least one record was rejected.
pub const EXIT_REJECTED: u8 = 6;

/// Map an engine error to its exit code.
pub fn recon_exit_code(err: &ReconError) -> u8 {
    match err {
        ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_USAGE,
        ReconError::MissingColumn { .. } | ReconError::DateParse { .. } | ReconError::Source(_) => {
            EXIT_INPUT
        }
        ReconError::Sink(_) => EXIT_OUTPUT,
        ReconError::DuplicateIdentity { .. } => EXIT_DUPLICATE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let codes = [
            EXIT_SUCCESS, EXIT_ERROR, EXIT_USAGE, EXIT_INPUT, EXIT_OUTPUT, EXIT_DUPLICATE, EXIT_REJECTED,
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn recon_errors_map_to_codes() {
        assert_eq!(recon_exit_code(&ReconError::ConfigParse("x".into())), EXIT_USAGE);
        assert_eq!(recon_exit_code(&ReconError::Source("x".into())), EXIT_INPUT);
        assert_eq!(recon_exit_code(&ReconError::Sink("x".into())), EXIT_OUTPUT);
        assert_eq!(
            recon_exit_code(&ReconError::DuplicateIdentity {
                identity: "1".into(),
                first: 0,
                second: 1
            }),
            EXIT_DUPLICATE
        );
    }
}

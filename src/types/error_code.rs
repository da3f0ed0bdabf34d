//! Numeric result codes reported by streaming backends

use serde::{Deserialize, Serialize};
use std::fmt;

/// Failure code returned by a [`Backend`](crate::backend::Backend) call.
///
/// Values match the capture SDK's result codes so they can be reported verbatim.
/// Success (`0`) is represented by `Ok(..)` and never appears here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    Internal,
    External,
    Network,
    Other,
    InvalidArgument,
    InvalidOperation,
    InvalidSize,
}

impl ErrorCode {
    /// Numeric value as reported by the SDK.
    pub fn code(self) -> i32 {
        match self {
            ErrorCode::Internal => 1,
            ErrorCode::External => 2,
            ErrorCode::Network => 3,
            ErrorCode::Other => 4,
            ErrorCode::InvalidArgument => 5,
            ErrorCode::InvalidOperation => 6,
            ErrorCode::InvalidSize => 7,
        }
    }

    /// Map a raw SDK code back to an error, `None` for success or unknown values.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(ErrorCode::Internal),
            2 => Some(ErrorCode::External),
            3 => Some(ErrorCode::Network),
            4 => Some(ErrorCode::Other),
            5 => Some(ErrorCode::InvalidArgument),
            6 => Some(ErrorCode::InvalidOperation),
            7 => Some(ErrorCode::InvalidSize),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

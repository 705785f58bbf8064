//! Verification helpers for recorded session calls
//!
//! Provides assertion helpers over a [`SessionCall`] sequence

use thiserror::Error;

use crate::fakes::SessionCall;

/// Verification error types
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("Expected call {expected:?} not found")]
    CallNotFound { expected: SessionCall },

    #[error("Unexpected call {actual:?}")]
    UnexpectedCall { actual: SessionCall },

    #[error("Expected {expected} {what} calls, found {actual}")]
    CallCountMismatch {
        what: String,
        expected: usize,
        actual: usize,
    },

    #[error("Call {later:?} was not issued after {earlier:?}")]
    OrderMismatch {
        earlier: SessionCall,
        later: SessionCall,
    },
}

/// Result type for verification operations
pub type VerifyResult<T> = Result<T, VerificationError>;

/// Session call verification helper
pub struct CallVerifier<'a> {
    calls: &'a [SessionCall],
}

impl<'a> CallVerifier<'a> {
    /// Create a new verifier over recorded calls
    pub fn new(calls: &'a [SessionCall]) -> Self {
        Self { calls }
    }

    /// Verify that a call was issued
    pub fn assert_called(&self, expected: &SessionCall) -> VerifyResult<()> {
        if self.calls.contains(expected) {
            Ok(())
        } else {
            Err(VerificationError::CallNotFound {
                expected: expected.clone(),
            })
        }
    }

    /// Verify that no reservation call was issued
    pub fn assert_nothing_reserved(&self) -> VerifyResult<()> {
        match self
            .calls
            .iter()
            .find(|c| matches!(c, SessionCall::Reserve { .. }))
        {
            Some(call) => Err(VerificationError::UnexpectedCall {
                actual: call.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Verify the number of calls matching a predicate
    pub fn assert_count(
        &self,
        what: &str,
        expected: usize,
        predicate: impl Fn(&SessionCall) -> bool,
    ) -> VerifyResult<()> {
        let actual = self.calls.iter().filter(|c| predicate(*c)).count();
        if actual != expected {
            return Err(VerificationError::CallCountMismatch {
                what: what.to_string(),
                expected,
                actual,
            });
        }
        Ok(())
    }

    /// Verify that `later` was first issued after the first `earlier`
    pub fn assert_before(&self, earlier: &SessionCall, later: &SessionCall) -> VerifyResult<()> {
        let first = self.position(earlier)?;
        let second = self.position(later)?;
        if second <= first {
            return Err(VerificationError::OrderMismatch {
                earlier: earlier.clone(),
                later: later.clone(),
            });
        }
        Ok(())
    }

    /// Reserved `(port, address)` pairs, in call order
    pub fn reservations(&self) -> Vec<(String, String)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SessionCall::Reserve { port, address, .. } => {
                    Some((port.clone(), address.clone()))
                }
                _ => None,
            })
            .collect()
    }

    fn position(&self, call: &SessionCall) -> VerifyResult<usize> {
        self.calls
            .iter()
            .position(|c| c == call)
            .ok_or_else(|| VerificationError::CallNotFound {
                expected: call.clone(),
            })
    }
}

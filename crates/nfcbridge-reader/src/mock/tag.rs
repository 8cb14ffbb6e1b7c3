//! Scriptable mock tag.

use crate::error::{ReaderError, Result};
use crate::traits::NfcTag;
use std::sync::{Arc, Mutex};
use subtle::ConstantTimeEq;

/// Default NDEF capacity in bytes (NTAG215-sized).
const DEFAULT_CAPACITY: usize = 496;

/// Mutable tag state, shared with [`MockTagProbe`] so tests can inspect a
/// tag after the scan loop consumed it.
#[derive(Debug, Default)]
struct TagState {
    records: Vec<String>,
    protected: bool,
    last_wipe: Option<u8>,
}

/// Mock tag with scriptable failure modes.
///
/// Built with defaults that classify as `ScanError` (present but empty);
/// chain the builder methods to script other behaviors.
#[derive(Debug, Clone)]
pub struct MockTag {
    product: String,
    tag_type: String,
    identifier: Vec<u8>,
    password: Option<String>,
    fail_authentication: bool,
    fail_format: bool,
    ndef: bool,
    capacity: usize,
    state: Arc<Mutex<TagState>>,
}

impl MockTag {
    pub fn new(identifier: Vec<u8>) -> Self {
        Self {
            product: "Mock NTAG215".to_string(),
            tag_type: "Type2Tag".to_string(),
            identifier,
            password: None,
            fail_authentication: false,
            fail_format: false,
            ndef: true,
            capacity: DEFAULT_CAPACITY,
            state: Arc::new(Mutex::new(TagState::default())),
        }
    }

    /// Set the secret the tag accepts for `authenticate`.
    #[must_use]
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Pre-load a stored record.
    #[must_use]
    pub fn with_record(self, text: impl Into<String>) -> Self {
        self.state.lock().unwrap().records.push(text.into());
        self
    }

    /// Script `authenticate` to fail at the transport level.
    #[must_use]
    pub fn failing_authentication(mut self) -> Self {
        self.fail_authentication = true;
        self
    }

    /// Script `format` to be refused by the tag.
    #[must_use]
    pub fn failing_format(mut self) -> Self {
        self.fail_format = true;
        self
    }

    /// Remove structured-storage capability.
    #[must_use]
    pub fn without_ndef(mut self) -> Self {
        self.ndef = false;
        self
    }

    /// Override the NDEF capacity in bytes.
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Mark the tag as already read-protected, so `protect` fails.
    #[must_use]
    pub fn already_protected(self) -> Self {
        self.state.lock().unwrap().protected = true;
        self
    }

    /// Probe handle for asserting on tag state after the scan loop is done
    /// with the tag.
    pub fn probe(&self) -> MockTagProbe {
        MockTagProbe {
            state: Arc::clone(&self.state),
        }
    }
}

impl NfcTag for MockTag {
    fn product(&self) -> &str {
        &self.product
    }

    fn tag_type(&self) -> &str {
        &self.tag_type
    }

    fn identifier(&self) -> &[u8] {
        &self.identifier
    }

    fn has_ndef(&self) -> bool {
        self.ndef
    }

    async fn authenticate(&mut self, secret: &str) -> Result<bool> {
        if self.fail_authentication {
            return Err(ReaderError::command_failed("tag left the field"));
        }
        // Constant-time comparison, as a real reader stack would do.
        Ok(self
            .password
            .as_ref()
            .is_some_and(|p| bool::from(p.as_bytes().ct_eq(secret.as_bytes()))))
    }

    async fn protect(&mut self, secret: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.protected {
            return Err(ReaderError::command_failed("tag is already protected"));
        }
        state.protected = true;
        self.password = Some(secret.to_string());
        Ok(())
    }

    async fn format(&mut self, wipe: u8) -> Result<bool> {
        if self.fail_format {
            return Ok(false);
        }
        let mut state = self.state.lock().unwrap();
        state.records.clear();
        state.last_wipe = Some(wipe);
        Ok(true)
    }

    async fn first_record(&mut self) -> Result<Option<String>> {
        Ok(self.state.lock().unwrap().records.first().cloned())
    }

    async fn write_record(&mut self, text: &str) -> Result<()> {
        if !self.ndef {
            return Err(ReaderError::command_failed("tag has no ndef"));
        }
        if text.len() > self.capacity {
            return Err(ReaderError::PayloadTooLarge {
                size: text.len(),
                capacity: self.capacity,
            });
        }
        self.state.lock().unwrap().records = vec![text.to_string()];
        Ok(())
    }
}

/// Read-only view into a mock tag's mutable state.
#[derive(Debug, Clone)]
pub struct MockTagProbe {
    state: Arc<Mutex<TagState>>,
}

impl MockTagProbe {
    /// Stored records, in order.
    pub fn records(&self) -> Vec<String> {
        self.state.lock().unwrap().records.clone()
    }

    /// Whether read protection has been applied.
    pub fn is_protected(&self) -> bool {
        self.state.lock().unwrap().protected
    }

    /// The wipe pattern of the last format, if the tag was formatted.
    pub fn last_wipe(&self) -> Option<u8> {
        self.state.lock().unwrap().last_wipe
    }
}

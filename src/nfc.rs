//! Device NFC access.
//!
//! The platform reader sits behind [`NfcDriver`]; [`NfcService`] adds the
//! one-time session start and guarantees every technology request it makes is
//! released again.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, error};

/// Tag technologies a read can ask the platform for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NfcTech {
    Ndef,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NfcTag {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NfcError {
    #[error("NFC is not available on this device")]
    HardwareUnavailable,
    #[error("NFC request cancelled")]
    Cancelled,
    #[error("NFC read failed: {0}")]
    Read(String),
}

#[async_trait]
pub trait NfcDriver: Send + Sync {
    /// Starts the platform NFC session.
    async fn start(&self) -> Result<(), NfcError>;

    /// Waits until a tag speaking `tech` is presented, or the platform gives up.
    async fn request_technology(&self, tech: NfcTech) -> Result<(), NfcError>;

    async fn get_tag(&self) -> Result<Option<NfcTag>, NfcError>;

    /// Releases the current technology request. Must be safe to call when none
    /// is active.
    fn cancel_technology_request(&self);
}

/// Releases the technology request when dropped, whichever way the read ends.
struct TechnologyRequest<'a> {
    driver: &'a dyn NfcDriver,
}

impl Drop for TechnologyRequest<'_> {
    fn drop(&mut self) {
        self.driver.cancel_technology_request();
    }
}

#[derive(Clone)]
pub struct NfcService {
    driver: Arc<dyn NfcDriver>,
    started: Arc<OnceCell<()>>,
}

impl NfcService {
    pub fn new(driver: Arc<dyn NfcDriver>) -> NfcService {
        NfcService {
            driver,
            started: Arc::new(OnceCell::new()),
        }
    }

    /// Starts the hardware session. Later calls return immediately; a failed
    /// start is retried on the next call.
    pub async fn init(&self) -> Result<(), NfcError> {
        self.started
            .get_or_try_init(|| async {
                self.driver.start().await?;
                debug!("nfc session started");
                Ok::<(), NfcError>(())
            })
            .await
            .map(|_| ())
    }

    /// Reads the id of the next NDEF tag presented. Empty if the tag has none.
    pub async fn read(&self) -> Result<String, NfcError> {
        let _request = TechnologyRequest { driver: &*self.driver };

        let tag = async {
            self.driver.request_technology(NfcTech::Ndef).await?;
            self.driver.get_tag().await
        }
        .await
        .inspect_err(|e| error!(error = %e, "reading nfc tag"))?;

        Ok(tag.and_then(|tag| tag.id).unwrap_or_default())
    }
}

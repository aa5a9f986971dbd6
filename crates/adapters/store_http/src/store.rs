//! reqwest-backed [`DeviceStore`].

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::de::DeserializeOwned;
use url::Url;

use nexushub_app::ports::DeviceStore;
use nexushub_domain::audit::{AccessLogEntry, AuditEntry, EnergyEvent, ThermalEvent};
use nexushub_domain::category::Subsystem;
use nexushub_domain::device::{Device, DeviceWriteBack};
use nexushub_domain::error::NexusError;

use crate::error::StoreError;

/// A collection exposed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Devices,
    ThermalEvents,
    AccessLog,
    EnergyEvents,
}

impl Collection {
    #[must_use]
    pub fn path(self) -> &'static str {
        match self {
            Self::Devices => "devices",
            Self::ThermalEvents => "thermalEvents",
            Self::AccessLog => "accessLog",
            Self::EnergyEvents => "energyEvents",
        }
    }

    /// Collection holding the audit records of `subsystem`.
    #[must_use]
    pub fn of(subsystem: Subsystem) -> Self {
        match subsystem {
            Subsystem::Rack => Self::ThermalEvents,
            Subsystem::Access => Self::AccessLog,
            Subsystem::Energy => Self::EnergyEvents,
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl HttpStoreConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Store client. Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpDeviceStore {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpDeviceStore {
    /// Build a client with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the client cannot
    /// be built.
    pub fn new(config: &HttpStoreConfig) -> Result<Self, StoreError> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Self::with_client(http, &config.base_url)
    }

    /// Wrap an existing `reqwest::Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse.
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self, StoreError> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { http, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, StoreError> {
        Ok(self.base_url.join(path)?)
    }

    async fn list<T: DeserializeOwned>(&self, collection: Collection) -> Result<Vec<T>, StoreError> {
        let url = self.url(collection.path())?;
        tracing::debug!(%url, "GET");
        let resp = self.http.get(url.clone()).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(StoreError::Status {
                status,
                url: url.to_string(),
            });
        }
        let body = resp.text().await?;
        let records: Vec<serde_json::Value> =
            serde_json::from_str(&body).map_err(|source| StoreError::Decode {
                collection: collection.path(),
                source,
            })?;
        Ok(decode_records(collection, records))
    }

    async fn send_json(
        &self,
        request: reqwest::RequestBuilder,
        url: Url,
    ) -> Result<(), StoreError> {
        let resp = request.send().await?;
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(StoreError::Status {
                status,
                url: url.to_string(),
            })
        }
    }

    async fn put_device(&self, write: &DeviceWriteBack) -> Result<(), StoreError> {
        let url = self.url(&format!("{}/{}", Collection::Devices, write.device_id))?;
        tracing::debug!(%url, "PUT");
        let request = self.http.put(url.clone()).json(&write.body());
        self.send_json(request, url).await
    }

    async fn post_entry(&self, entry: &AuditEntry) -> Result<(), StoreError> {
        let url = self.url(Collection::of(entry.subsystem()).path())?;
        tracing::debug!(%url, "POST");
        let request = self.http.post(url.clone()).json(&entry.record());
        self.send_json(request, url).await
    }
}

/// Decode each record on its own, dropping the ones that do not fit.
fn decode_records<T: DeserializeOwned>(
    collection: Collection,
    records: Vec<serde_json::Value>,
) -> Vec<T> {
    records
        .into_iter()
        .filter_map(|record| match serde_json::from_value(record) {
            Ok(item) => Some(item),
            Err(err) => {
                tracing::debug!(%err, %collection, "skipping undecodable record");
                None
            }
        })
        .collect()
}

impl DeviceStore for HttpDeviceStore {
    fn fetch_devices(&self) -> impl Future<Output = Result<Vec<Device>, NexusError>> + Send {
        async move {
            self.list(Collection::Devices)
                .await
                .map_err(StoreError::into_domain)
        }
    }

    fn fetch_thermal_events(
        &self,
    ) -> impl Future<Output = Result<Vec<ThermalEvent>, NexusError>> + Send {
        async move {
            self.list(Collection::ThermalEvents)
                .await
                .map_err(StoreError::into_domain)
        }
    }

    fn fetch_access_log(
        &self,
    ) -> impl Future<Output = Result<Vec<AccessLogEntry>, NexusError>> + Send {
        async move {
            self.list(Collection::AccessLog)
                .await
                .map_err(StoreError::into_domain)
        }
    }

    fn fetch_energy_events(
        &self,
    ) -> impl Future<Output = Result<Vec<EnergyEvent>, NexusError>> + Send {
        async move {
            self.list(Collection::EnergyEvents)
                .await
                .map_err(StoreError::into_domain)
        }
    }

    fn update_device(
        &self,
        write: &DeviceWriteBack,
    ) -> impl Future<Output = Result<(), NexusError>> + Send {
        async move { self.put_device(write).await.map_err(StoreError::into_domain) }
    }

    fn append_entry(
        &self,
        entry: &AuditEntry,
    ) -> impl Future<Output = Result<(), NexusError>> + Send {
        async move { self.post_entry(entry).await.map_err(StoreError::into_domain) }
    }
}

use crate::Result;

use strata_core::{
    async_trait,
    driver::{Capability, Driver},
    Connection, Error,
};

use std::borrow::Cow;
use url::Url;

/// Selects the driver from the scheme of a connection URL.
#[derive(Debug)]
pub struct Connect {
    url: Url,
}

impl Connect {
    pub fn new(url: &str) -> Result<Self> {
        let url = Url::parse(url)
            .map_err(|err| Error::invalid_connection_url(format!("{err}; url={url}")))?;

        match url.scheme() {
            "sqlite" => Ok(Self { url }),
            scheme => Err(Error::invalid_connection_url(format!(
                "unsupported database; scheme={scheme}; url={url}"
            ))),
        }
    }
}

#[async_trait]
impl Driver for Connect {
    fn url(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.url.as_str())
    }

    fn capability(&self) -> &'static Capability {
        &Capability::SQLITE
    }

    async fn connect(&self) -> Result<Box<dyn Connection>> {
        connect_sqlite(&self.url).await
    }
}

#[cfg(feature = "sqlite")]
async fn connect_sqlite(url: &Url) -> Result<Box<dyn Connection>> {
    strata_driver_sqlite::Sqlite::new(url.as_str())?
        .connect()
        .await
}

#[cfg(not(feature = "sqlite"))]
async fn connect_sqlite(_url: &Url) -> Result<Box<dyn Connection>> {
    Err(anyhow::anyhow!("`sqlite` feature not enabled").into())
}

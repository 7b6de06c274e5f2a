use tokio::sync::OnceCell;

use super::{BackendError, Result, SharedBackend};

type Connector = Box<dyn Fn() -> Result<SharedBackend> + Send + Sync>;

/// Process-wide handle to the flag backend.
///
/// The backend is connected and initialized on first use. Callers racing
/// through a cold start all wait on the same initialization; if it fails the
/// handle stays empty and the next caller tries again.
pub struct ClientAccessor {
    cell: OnceCell<SharedBackend>,
    connect: Connector,
}

impl ClientAccessor {
    pub fn new<F>(connect: F) -> Self
    where
        F: Fn() -> Result<SharedBackend> + Send + Sync + 'static,
    {
        ClientAccessor {
            cell: OnceCell::new(),
            connect: Box::new(connect),
        }
    }

    pub async fn get_or_create(&self) -> Result<SharedBackend> {
        let client = self
            .cell
            .get_or_try_init(|| async {
                tracing::info!("connecting to flag backend");
                let client = (self.connect)()?;
                client.wait_for_initialization().await?;
                Ok::<_, BackendError>(client)
            })
            .await?;

        Ok(client.clone())
    }

    #[cfg(test)]
    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }
}

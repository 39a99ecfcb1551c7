use crate::error::{other_error, DaemonResult, Error};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

// Export components
pub mod desktop_notify;
pub mod google_calendar;
pub mod reminders;
pub mod working_location;

/// Component trait that all long-running units implement
#[async_trait]
pub trait Component: Send + Sync {
    /// Get the name of the component
    fn name(&self) -> &'static str;

    /// Run until `shutdown` is cancelled (returning `Error::Cancelled`) or a fatal error occurs
    async fn run(&self, shutdown: CancellationToken) -> DaemonResult<()>;
}

/// Manager for all components
#[derive(Default)]
pub struct ComponentManager {
    components: Vec<Arc<dyn Component>>,
}

impl fmt::Debug for ComponentManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentManager")
            .field("components", &self.names())
            .finish()
    }
}

impl ComponentManager {
    /// Create a new component manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component
    pub fn register<T: Component + 'static>(&mut self, component: T) {
        info!("Registering component: {}", component.name());
        self.components.push(Arc::new(component));
    }

    /// Names of the registered components
    pub fn names(&self) -> Vec<&'static str> {
        self.components.iter().map(|c| c.name()).collect()
    }

    /// Run all registered components concurrently.
    ///
    /// The first failure other than cancellation cancels `shutdown` for the
    /// rest; once every component has returned, that failure is reported.
    pub async fn run_all(&self, shutdown: CancellationToken) -> DaemonResult<()> {
        let mut tasks = JoinSet::new();
        for component in &self.components {
            info!("Starting component: {}", component.name());
            let component = Arc::clone(component);
            let token = shutdown.clone();
            tasks.spawn(async move {
                let name = component.name();
                (name, component.run(token).await)
            });
        }

        let mut first_error: Option<Error> = None;
        while let Some(joined) = tasks.join_next().await {
            let failure = match joined {
                Ok((name, Ok(()))) => {
                    info!("Component {} finished", name);
                    None
                }
                Ok((name, Err(e))) if e.is_cancelled() => {
                    info!("Component {} stopped", name);
                    None
                }
                Ok((name, Err(e))) => {
                    error!("Component {} failed: {}", name, e);
                    Some(e)
                }
                Err(e) => {
                    error!("Component task panicked: {}", e);
                    Some(other_error(&format!("Component task failed: {}", e)))
                }
            };

            if let Some(e) = failure {
                shutdown.cancel();
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

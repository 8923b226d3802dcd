//! Everything one portal session needs, wired over a single medium.

use std::sync::Arc;

use log::info;

use crate::app_response::AppResponse;
use crate::birthday_feed::BirthdayFeed;
use crate::change_bus::ChangeBus;
use crate::comment_ledger::CommentLedger;
use crate::domain_repository::DomainRepository;
use crate::identity::IdentityProvider;
use crate::like_ledger::LikeLedger;
use crate::notifier::{LogNotifier, Notifier};
use crate::portal_config::PortalConfig;
use crate::portal_model::{PortalRequest, VacationBalance};
use crate::record_store::PartitionKey;
use crate::storage_medium::{LmdbMedium, MemoryMedium, StorageMedium};

pub struct PortalState {
    pub config: PortalConfig,
    pub medium: Arc<dyn StorageMedium>,
    pub bus: Arc<ChangeBus>,
    pub identity: Arc<IdentityProvider>,
    pub likes: Arc<LikeLedger>,
    pub comments: Arc<CommentLedger>,
    pub vacations: DomainRepository<VacationBalance>,
    pub requests: DomainRepository<PortalRequest>,
    notifier: Arc<dyn Notifier>,
    lmdb: Option<Arc<LmdbMedium>>,
}

impl PortalState {
    /// Opens (or creates) the LMDB store at `config.storage_path`.
    pub fn init(config: PortalConfig) -> Result<Self, AppResponse> {
        config.validate()?;
        let lmdb = Arc::new(LmdbMedium::init(&config)?);
        let mut state = Self::with_medium(config, lmdb.clone(), Arc::new(LogNotifier));
        state.lmdb = Some(lmdb);
        Ok(state)
    }

    pub fn in_memory(config: PortalConfig) -> Self {
        Self::with_medium(config, Arc::new(MemoryMedium::new()), Arc::new(LogNotifier))
    }

    pub fn with_medium(
        config: PortalConfig,
        medium: Arc<dyn StorageMedium>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let bus = Arc::new(ChangeBus::new());
        let identity = Arc::new(IdentityProvider::new(Arc::clone(&medium)));
        let likes = Arc::new(LikeLedger::new(Arc::clone(&medium), &config.likes_domain));
        let comments = Arc::new(CommentLedger::with_partition(
            Arc::clone(&medium),
            PartitionKey::yearly(config.comments_domain.clone()),
            config.max_comment_chars,
        ));
        let vacations = DomainRepository::new(Arc::clone(&medium), Arc::clone(&bus));
        let requests = DomainRepository::new(Arc::clone(&medium), Arc::clone(&bus));

        info!(
            "Portal state ready (likes: {}, comments: {})",
            config.likes_domain, config.comments_domain
        );
        PortalState {
            config,
            medium,
            bus,
            identity,
            likes,
            comments,
            vacations,
            requests,
            notifier,
            lmdb: None,
        }
    }

    pub fn birthday_feed(&self) -> BirthdayFeed {
        BirthdayFeed::new(
            Arc::clone(&self.likes),
            Arc::clone(&self.comments),
            Arc::clone(&self.identity),
            Arc::clone(&self.notifier),
        )
    }

    /// Flushes the LMDB store, if any, and releases the session.
    pub fn close(self) -> Result<(), AppResponse> {
        if let Some(lmdb) = &self.lmdb {
            lmdb.sync()?;
        }
        info!("Portal state closed ({})", self.config.storage_path);
        Ok(())
    }
}

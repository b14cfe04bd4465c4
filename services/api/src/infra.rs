use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use underwriting::config::AppConfig;
use underwriting::error::AppError;
use underwriting::workflows::loans::applications::{
    ApplicationId, ApplicationRecord, ApplicationRepository, DecisionNotice,
    LoanApplicationStatus, NoticeError, NoticePublisher, PolicyBundle, RepositoryError,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.profile.application_id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.profile.application_id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.profile.application_id) {
            guard.insert(record.profile.application_id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn pending(&self, _limit: usize) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard
            .values()
            .filter(|record| record.status == LoanApplicationStatus::Submitted)
            .cloned()
            .collect())
    }
}

/// Notice sink that keeps decision notices in memory for demos and tests; a
/// production deployment swaps in a mail/letter adapter here.
#[derive(Default, Clone)]
pub(crate) struct InMemoryNoticePublisher {
    events: Arc<Mutex<Vec<DecisionNotice>>>,
}

impl NoticePublisher for InMemoryNoticePublisher {
    fn publish(&self, notice: DecisionNotice) -> Result<(), NoticeError> {
        let mut guard = self.events.lock().expect("notice mutex poisoned");
        guard.push(notice);
        Ok(())
    }
}

impl InMemoryNoticePublisher {
    pub(crate) fn events(&self) -> Vec<DecisionNotice> {
        self.events.lock().expect("notice mutex poisoned").clone()
    }
}

/// Policy selection: an external bundle when `APP_POLICY_PATH` points at one,
/// otherwise the built-in standard bundle. Validation happens inside
/// `from_reader`/engine construction either way.
pub(crate) fn load_policy_bundle(config: &AppConfig) -> Result<PolicyBundle, AppError> {
    match &config.policy_path {
        Some(path) => {
            let file = std::fs::File::open(path)?;
            Ok(PolicyBundle::from_reader(file)?)
        }
        None => Ok(PolicyBundle::standard()),
    }
}

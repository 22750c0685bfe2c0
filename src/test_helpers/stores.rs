//! In-memory store implementations mirroring the PostgreSQL semantics.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use uuid::Uuid;

use crate::models::{
    BulkActionItem, BulkActionJob, Candidate, JobCounters, MessageTemplate, NewBulkActionJob,
    NewMessageTemplate,
};
use crate::orchestration::store::{JobStore, StoreError};
use crate::orchestration::types::ExecutorResult;
use crate::services::candidates::{CandidateStore, CandidateStoreError};
use crate::services::templates::{TemplateStore, TemplateStoreError};
use crate::state_machine::{ItemState, JobState};

fn now() -> chrono::NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

/// In-memory [`JobStore`] with the same guarded-write semantics as
/// [`crate::orchestration::store::PgJobStore`]
#[derive(Default)]
pub struct InMemoryJobStore {
    jobs: Mutex<HashMap<Uuid, BulkActionJob>>,
    items: Mutex<HashMap<Uuid, BulkActionItem>>,
    item_order: Mutex<HashMap<Uuid, Vec<Uuid>>>,
    fail_item_loads: AtomicBool,
}

impl InMemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `list_items` calls fail, simulating a top-level
    /// batch fault
    pub fn fail_item_loads(&self, fail: bool) {
        self.fail_item_loads.store(fail, Ordering::SeqCst);
    }

    /// Snapshot a job row (test assertions)
    pub fn job_snapshot(&self, job_id: Uuid) -> Option<BulkActionJob> {
        self.jobs.lock().get(&job_id).cloned()
    }

    /// Number of job rows in the store (test assertions)
    pub fn job_count(&self) -> usize {
        self.jobs.lock().len()
    }

    /// Snapshot all items for a job in submission order (test assertions)
    pub fn item_snapshots(&self, job_id: Uuid) -> Vec<BulkActionItem> {
        let order = self.item_order.lock();
        let items = self.items.lock();
        order
            .get(&job_id)
            .map(|ids| ids.iter().filter_map(|id| items.get(id).cloned()).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl JobStore for InMemoryJobStore {
    async fn create_job(
        &self,
        new_job: &NewBulkActionJob,
    ) -> Result<(BulkActionJob, Vec<BulkActionItem>), StoreError> {
        let created_at = now();
        let job = BulkActionJob {
            job_id: Uuid::new_v4(),
            action_type: new_job.action_type.to_string(),
            status: JobState::Pending.to_string(),
            total_count: new_job.candidate_ids.len() as i32,
            processed_count: 0,
            success_count: 0,
            failed_count: 0,
            parameters: new_job.parameters.clone(),
            created_by: new_job.created_by.clone(),
            error_log: Value::Array(Vec::new()),
            created_at,
            started_at: None,
            completed_at: None,
            updated_at: created_at,
        };

        let items: Vec<BulkActionItem> = new_job
            .candidate_ids
            .iter()
            .map(|candidate_id| BulkActionItem {
                item_id: Uuid::new_v4(),
                job_id: job.job_id,
                candidate_id: *candidate_id,
                action_type: job.action_type.clone(),
                status: ItemState::Pending.to_string(),
                result: None,
                error_message: None,
                processed_at: None,
                created_at,
            })
            .collect();

        // Single lock scope stands in for the creation transaction
        {
            let mut jobs = self.jobs.lock();
            let mut item_map = self.items.lock();
            let mut order = self.item_order.lock();
            jobs.insert(job.job_id, job.clone());
            order.insert(job.job_id, items.iter().map(|i| i.item_id).collect());
            for item in &items {
                item_map.insert(item.item_id, item.clone());
            }
        }
        Ok((job, items))
    }

    async fn get_job(&self, job_id: Uuid) -> Result<BulkActionJob, StoreError> {
        self.jobs
            .lock()
            .get(&job_id)
            .cloned()
            .ok_or(StoreError::JobNotFound(job_id))
    }

    async fn mark_processing(&self, job_id: Uuid) -> Result<bool, StoreError> {
        let mut jobs = self.jobs.lock();
        let job = jobs.get_mut(&job_id).ok_or(StoreError::JobNotFound(job_id))?;
        if job.state() != JobState::Pending {
            return Ok(false);
        }
        job.status = JobState::Processing.to_string();
        job.started_at = Some(now());
        job.updated_at = now();
        Ok(true)
    }

    async fn list_items(&self, job_id: Uuid) -> Result<Vec<BulkActionItem>, StoreError> {
        if self.fail_item_loads.load(Ordering::SeqCst) {
            return Err(StoreError::Database(
                "simulated item load failure".to_string(),
            ));
        }
        Ok(self.item_snapshots(job_id))
    }

    async fn update_item_result(
        &self,
        item_id: Uuid,
        outcome: &ExecutorResult,
    ) -> Result<bool, StoreError> {
        let mut items = self.items.lock();
        let item = items
            .get_mut(&item_id)
            .ok_or(StoreError::ItemNotFound(item_id))?;
        if item.state().is_terminal() {
            return Ok(false);
        }
        item.status = ItemState::terminal_for(outcome.success).to_string();
        item.result = outcome.content.clone();
        item.error_message = outcome.error.clone();
        item.processed_at = Some(now());
        Ok(true)
    }

    async fn increment_counters(
        &self,
        job_id: Uuid,
        success: bool,
    ) -> Result<JobCounters, StoreError> {
        let mut jobs = self.jobs.lock();
        let job = jobs.get_mut(&job_id).ok_or(StoreError::JobNotFound(job_id))?;
        job.processed_count += 1;
        if success {
            job.success_count += 1;
        } else {
            job.failed_count += 1;
        }
        job.updated_at = now();
        let counters = job.counters();
        debug_assert!(counters.is_consistent());
        Ok(counters)
    }

    async fn finalize_job(&self, job_id: Uuid, final_state: JobState) -> Result<bool, StoreError> {
        let mut jobs = self.jobs.lock();
        let job = jobs.get_mut(&job_id).ok_or(StoreError::JobNotFound(job_id))?;
        if job.state() != JobState::Processing {
            return Ok(false);
        }
        job.status = final_state.to_string();
        job.completed_at = Some(now());
        job.updated_at = now();
        Ok(true)
    }

    async fn append_error(&self, job_id: Uuid, message: &str) -> Result<(), StoreError> {
        let mut jobs = self.jobs.lock();
        let job = jobs.get_mut(&job_id).ok_or(StoreError::JobNotFound(job_id))?;
        if let Value::Array(entries) = &mut job.error_log {
            entries.push(Value::String(message.to_string()));
        }
        job.updated_at = now();
        Ok(())
    }

    async fn recent_items(
        &self,
        job_id: Uuid,
        limit: i64,
    ) -> Result<Vec<BulkActionItem>, StoreError> {
        let mut processed: Vec<BulkActionItem> = self
            .item_snapshots(job_id)
            .into_iter()
            .filter(|item| item.state().is_terminal())
            .collect();
        processed.sort_by(|a, b| b.processed_at.cmp(&a.processed_at));
        processed.truncate(limit.max(0) as usize);
        Ok(processed)
    }
}

/// In-memory [`CandidateStore`] seeded by tests
#[derive(Default)]
pub struct InMemoryCandidateStore {
    candidates: Mutex<HashMap<Uuid, Candidate>>,
}

impl InMemoryCandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a candidate with the given tags, returning its id
    pub fn insert(&self, first_name: &str, company: Option<&str>, tags: &[&str]) -> Uuid {
        let candidate_id = Uuid::new_v4();
        let candidate = Candidate {
            candidate_id,
            first_name: first_name.to_string(),
            last_name: "Example".to_string(),
            email: Some(format!("{}@example.com", first_name.to_lowercase())),
            company: company.map(str::to_string),
            title: None,
            pipeline_stage: Some("sourced".to_string()),
            tags: Value::Array(tags.iter().map(|t| Value::String((*t).to_string())).collect()),
        };
        self.candidates.lock().insert(candidate_id, candidate);
        candidate_id
    }

    /// Snapshot a candidate (test assertions)
    pub fn snapshot(&self, candidate_id: Uuid) -> Option<Candidate> {
        self.candidates.lock().get(&candidate_id).cloned()
    }
}

#[async_trait]
impl CandidateStore for InMemoryCandidateStore {
    async fn get(&self, candidate_id: Uuid) -> Result<Candidate, CandidateStoreError> {
        self.candidates
            .lock()
            .get(&candidate_id)
            .cloned()
            .ok_or(CandidateStoreError::NotFound(candidate_id))
    }

    async fn add_tag(&self, candidate_id: Uuid, tag: &str) -> Result<bool, CandidateStoreError> {
        let mut candidates = self.candidates.lock();
        let candidate = candidates
            .get_mut(&candidate_id)
            .ok_or(CandidateStoreError::NotFound(candidate_id))?;
        if candidate.has_tag(tag) {
            return Ok(false);
        }
        if let Value::Array(tags) = &mut candidate.tags {
            tags.push(Value::String(tag.to_string()));
        }
        Ok(true)
    }

    async fn set_stage(
        &self,
        candidate_id: Uuid,
        stage: &str,
    ) -> Result<(), CandidateStoreError> {
        let mut candidates = self.candidates.lock();
        let candidate = candidates
            .get_mut(&candidate_id)
            .ok_or(CandidateStoreError::NotFound(candidate_id))?;
        candidate.pipeline_stage = Some(stage.to_string());
        Ok(())
    }
}

/// In-memory [`TemplateStore`]
#[derive(Default)]
pub struct InMemoryTemplateStore {
    templates: Mutex<HashMap<String, MessageTemplate>>,
}

impl InMemoryTemplateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn create(
        &self,
        new_template: &NewMessageTemplate,
    ) -> Result<MessageTemplate, TemplateStoreError> {
        let mut templates = self.templates.lock();
        if templates.contains_key(&new_template.name) {
            return Err(TemplateStoreError::DuplicateName(new_template.name.clone()));
        }
        let template = MessageTemplate {
            template_id: Uuid::new_v4(),
            name: new_template.name.clone(),
            template_type: new_template.template_type.clone(),
            base_template: new_template.base_template.clone(),
            variables: new_template.variables.clone(),
            created_at: now(),
            updated_at: now(),
        };
        templates.insert(template.name.clone(), template.clone());
        Ok(template)
    }

    async fn list(&self) -> Result<Vec<MessageTemplate>, TemplateStoreError> {
        let mut all: Vec<MessageTemplate> = self.templates.lock().values().cloned().collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn find_by_name(
        &self,
        name: &str,
    ) -> Result<Option<MessageTemplate>, TemplateStoreError> {
        Ok(self.templates.lock().get(name).cloned())
    }
}

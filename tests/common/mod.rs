//! In-memory collaborators shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use ai_labeler::decision::{ClassificationRequest, LabelModel, ModelError};
use ai_labeler::github::{ClientError, CreateLabelInput, ItemSource, LabelSource, Repository};
use ai_labeler::models::*;
use async_trait::async_trait;

pub fn repo() -> Repository {
    Repository::new("octo", "widgets")
}

pub fn issue(number: u64, title: &str, body: &str) -> Item {
    Item::Issue {
        number,
        title: title.to_string(),
        body: body.to_string(),
        author: "octocat".to_string(),
        linked_items: vec![],
    }
}

pub fn pull_request(number: u64, title: &str, body: &str, files: &[(&str, &str)]) -> Item {
    Item::PullRequest {
        number,
        title: title.to_string(),
        body: body.to_string(),
        files: files
            .iter()
            .map(|(path, patch)| (path.to_string(), patch.to_string()))
            .collect::<BTreeMap<_, _>>(),
        author: "octocat".to_string(),
        linked_items: vec![],
    }
}

pub fn names(labels: &[Label]) -> Vec<&str> {
    labels.iter().map(|l| l.name.as_str()).collect()
}

/// A fake GitHub recording every mutation.
#[derive(Default)]
pub struct FakeGitHub {
    pub labels: Mutex<Vec<Label>>,
    pub items: Mutex<HashMap<u64, Item>>,
    pub linked: Mutex<HashMap<u64, LinkedItem>>,
    pub list_calls: Mutex<usize>,
    pub created: Mutex<Vec<CreateLabelInput>>,
    pub added: Mutex<Vec<(u64, Vec<String>)>>,
    pub fail_create: bool,
    pub fail_add: bool,
}

impl FakeGitHub {
    pub fn with_labels(labels: &[(&str, &str)]) -> Self {
        let fake = Self::default();
        *fake.labels.lock().unwrap() = labels
            .iter()
            .map(|(name, description)| Label::new(*name).with_description(*description))
            .collect();
        fake
    }

    pub fn add_item(&self, item: Item) {
        self.items.lock().unwrap().insert(item.number(), item);
    }

    pub fn add_linked(&self, linked: LinkedItem) {
        self.linked.lock().unwrap().insert(linked.number, linked);
    }

    pub fn created_names(&self) -> Vec<String> {
        self.created
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.name.clone())
            .collect()
    }

    pub fn added(&self) -> Vec<(u64, Vec<String>)> {
        self.added.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        *self.list_calls.lock().unwrap()
    }
}

#[async_trait]
impl ItemSource for FakeGitHub {
    async fn fetch_item(&self, _repo: &Repository, number: u64) -> Result<Item, ClientError> {
        self.items
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("#{}", number)))
    }

    async fn fetch_linked_item(
        &self,
        _repo: &Repository,
        number: u64,
    ) -> Result<LinkedItem, ClientError> {
        self.linked
            .lock()
            .unwrap()
            .get(&number)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("#{}", number)))
    }
}

#[async_trait]
impl LabelSource for FakeGitHub {
    async fn list_labels(&self, _repo: &Repository) -> Result<Vec<Label>, ClientError> {
        *self.list_calls.lock().unwrap() += 1;
        Ok(self.labels.lock().unwrap().clone())
    }

    async fn create_label(
        &self,
        _repo: &Repository,
        input: &CreateLabelInput,
    ) -> Result<(), ClientError> {
        self.created.lock().unwrap().push(input.clone());
        if self.fail_create {
            return Err(ClientError::Forbidden("no permission".to_string()));
        }
        Ok(())
    }

    async fn add_labels(
        &self,
        _repo: &Repository,
        number: u64,
        names: &[String],
    ) -> Result<(), ClientError> {
        if self.fail_add {
            return Err(ClientError::Server("500: boom".to_string()));
        }
        self.added.lock().unwrap().push((number, names.to_vec()));
        Ok(())
    }
}

/// A model that answers with a canned reply and records its requests.
pub struct ScriptedModel {
    reply: Result<String, String>,
    pub requests: Mutex<Vec<ClassificationRequest>>,
}

impl ScriptedModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> ClassificationRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("model was not called")
    }
}

#[async_trait]
impl LabelModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn classify(&self, request: &ClassificationRequest) -> Result<String, ModelError> {
        self.requests.lock().unwrap().push(request.clone());
        self.reply
            .clone()
            .map_err(|message| ModelError::Api {
                status: 503,
                message,
            })
    }
}

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client as DynamoClient;
use chrono::{DateTime, Utc};

use super::{BidStore, TaskStore};
use crate::bids::{Bid, BidStatus};
use crate::error::StoreError;
use crate::tasks::{Category, Task, TaskChanges};

type Item = HashMap<String, AttributeValue>;

/// Tasks table, keyed by `id`.
#[derive(Clone)]
pub struct DynamoTaskStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoTaskStore {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

#[async_trait]
impl TaskStore for DynamoTaskStore {
    async fn insert_task(&self, task: &Task) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(task_to_item(task)))
            .condition_expression("attribute_not_exists(id)")
            .send()
            .await
            .map_err(|e| store_error("put_item", e))?;
        Ok(())
    }

    async fn find_task(&self, id: &str) -> Result<Option<Task>, StoreError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .send()
            .await
            .map_err(|e| store_error("get_item", e))?;

        Ok(result.item().and_then(task_from_item))
    }

    async fn all_tasks(&self) -> Result<Vec<Task>, StoreError> {
        let items = scan_all(&self.client, &self.table_name, None).await?;
        Ok(items.iter().filter_map(task_from_item).collect())
    }

    async fn tasks_by_creator(&self, creator_email: &str) -> Result<Vec<Task>, StoreError> {
        let items = scan_all(
            &self.client,
            &self.table_name,
            Some(("creatorEmail", creator_email)),
        )
        .await?;
        Ok(items.iter().filter_map(task_from_item).collect())
    }

    async fn update_task(
        &self,
        id: &str,
        changes: &TaskChanges,
        updated_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let update = TaskUpdate::new(changes, updated_at);

        let mut builder = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .update_expression(update.expression())
            .condition_expression("attribute_exists(id)");

        for (k, v) in update.names {
            builder = builder.expression_attribute_names(k, v);
        }

        for (k, v) in update.values {
            builder = builder.expression_attribute_values(k, v);
        }

        match builder.send().await {
            Ok(_) => Ok(true),
            Err(e)
                if e.as_service_error()
                    .map(|se| se.is_conditional_check_failed_exception())
                    .unwrap_or(false) =>
            {
                Ok(false)
            }
            Err(e) => Err(store_error("update_item", e)),
        }
    }

    async fn delete_task(&self, id: &str) -> Result<bool, StoreError> {
        let result = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .key("id", AttributeValue::S(id.to_string()))
            .return_values(ReturnValue::AllOld)
            .send()
            .await
            .map_err(|e| store_error("delete_item", e))?;

        Ok(result.attributes().is_some_and(|old| !old.is_empty()))
    }
}

/// Bids table, keyed by `id`.
#[derive(Clone)]
pub struct DynamoBidStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoBidStore {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }
}

#[async_trait]
impl BidStore for DynamoBidStore {
    async fn insert_bid(&self, bid: &Bid) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(bid_to_item(bid)))
            .condition_expression("attribute_not_exists(id)")
            .send()
            .await
            .map_err(|e| store_error("put_item", e))?;
        Ok(())
    }

    async fn bids_for_task(&self, task_id: &str) -> Result<Vec<Bid>, StoreError> {
        let items = scan_all(&self.client, &self.table_name, Some(("taskId", task_id))).await?;
        Ok(items.iter().filter_map(bid_from_item).collect())
    }

    async fn bids_by_bidder(&self, bidder_email: &str) -> Result<Vec<Bid>, StoreError> {
        let items = scan_all(
            &self.client,
            &self.table_name,
            Some(("bidderEmail", bidder_email)),
        )
        .await?;
        Ok(items.iter().filter_map(bid_from_item).collect())
    }
}

/// Scan the whole table, following `LastEvaluatedKey`, optionally keeping
/// only items whose string attribute equals a value.
async fn scan_all(
    client: &DynamoClient,
    table_name: &str,
    filter: Option<(&str, &str)>,
) -> Result<Vec<Item>, StoreError> {
    let mut items = Vec::new();
    let mut start_key: Option<Item> = None;

    loop {
        let mut request = client
            .scan()
            .table_name(table_name)
            .set_exclusive_start_key(start_key.take());

        if let Some((attribute, value)) = filter {
            request = request
                .filter_expression("#attr = :value")
                .expression_attribute_names("#attr", attribute)
                .expression_attribute_values(":value", AttributeValue::S(value.to_string()));
        }

        let page = request.send().await.map_err(|e| store_error("scan", e))?;
        items.extend(page.items().iter().cloned());

        match page.last_evaluated_key() {
            Some(key) if !key.is_empty() => start_key = Some(key.clone()),
            _ => break,
        }
    }

    Ok(items)
}

fn store_error<E: std::error::Error>(operation: &str, e: E) -> StoreError {
    StoreError(format!("DynamoDB {} error: {}", operation, DisplayErrorContext(e)))
}

fn string(item: &Item, key: &str) -> Option<String> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
}

fn number(item: &Item, key: &str) -> Option<f64> {
    item.get(key)
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse().ok())
}

fn timestamp(item: &Item, key: &str) -> Option<DateTime<Utc>> {
    string(item, key)
        .and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

/// `SET` clauses for a partial task update. Only changed attributes are
/// named, so writes to other attributes are left alone.
struct TaskUpdate {
    clauses: Vec<String>,
    names: HashMap<String, String>,
    values: Item,
}

impl TaskUpdate {
    fn new(changes: &TaskChanges, updated_at: DateTime<Utc>) -> Self {
        let mut update = TaskUpdate {
            clauses: Vec::new(),
            names: HashMap::new(),
            values: Item::new(),
        };

        if let Some(title) = &changes.title {
            update.set("title", AttributeValue::S(title.clone()));
        }
        if let Some(category) = changes.category {
            update.set("category", AttributeValue::S(category.as_str().to_string()));
        }
        if let Some(budget) = changes.budget {
            update.set("budget", AttributeValue::N(budget.to_string()));
        }
        if let Some(deadline) = &changes.deadline {
            update.set("deadline", AttributeValue::S(deadline.clone()));
        }
        if let Some(description) = &changes.description {
            update.set("description", AttributeValue::S(description.clone()));
        }
        update.set("updatedAt", AttributeValue::S(updated_at.to_rfc3339()));
        update
    }

    fn set(&mut self, attribute: &str, value: AttributeValue) {
        self.clauses.push(format!("#{attribute} = :{attribute}"));
        self.names.insert(format!("#{attribute}"), attribute.to_string());
        self.values.insert(format!(":{attribute}"), value);
    }

    fn expression(&self) -> String {
        format!("SET {}", self.clauses.join(", "))
    }
}

fn task_to_item(task: &Task) -> Item {
    let mut item = Item::new();
    item.insert("id".into(), AttributeValue::S(task.id.clone()));
    item.insert("title".into(), AttributeValue::S(task.title.clone()));
    item.insert(
        "category".into(),
        AttributeValue::S(task.category.as_str().to_string()),
    );
    item.insert("budget".into(), AttributeValue::N(task.budget.to_string()));
    item.insert("deadline".into(), AttributeValue::S(task.deadline.clone()));
    item.insert(
        "description".into(),
        AttributeValue::S(task.description.clone()),
    );
    item.insert(
        "creatorEmail".into(),
        AttributeValue::S(task.creator_email.clone()),
    );
    if let Some(name) = &task.creator_name {
        item.insert("creatorName".into(), AttributeValue::S(name.clone()));
    }
    item.insert(
        "createdAt".into(),
        AttributeValue::S(task.created_at.to_rfc3339()),
    );
    if let Some(updated_at) = task.updated_at {
        item.insert("updatedAt".into(), AttributeValue::S(updated_at.to_rfc3339()));
    }
    item
}

fn task_from_item(item: &Item) -> Option<Task> {
    Some(Task {
        id: string(item, "id")?,
        title: string(item, "title").unwrap_or_default(),
        category: string(item, "category")
            .and_then(|c| Category::parse(&c))
            .unwrap_or(Category::Other),
        budget: number(item, "budget").unwrap_or_default(),
        deadline: string(item, "deadline").unwrap_or_default(),
        description: string(item, "description").unwrap_or_default(),
        creator_email: string(item, "creatorEmail").unwrap_or_default(),
        creator_name: string(item, "creatorName"),
        created_at: timestamp(item, "createdAt").unwrap_or_default(),
        updated_at: timestamp(item, "updatedAt"),
    })
}

fn bid_to_item(bid: &Bid) -> Item {
    let mut item = Item::new();
    item.insert("id".into(), AttributeValue::S(bid.id.clone()));
    item.insert("taskId".into(), AttributeValue::S(bid.task_id.clone()));
    item.insert(
        "bidderEmail".into(),
        AttributeValue::S(bid.bidder_email.clone()),
    );
    item.insert(
        "biddingAmount".into(),
        AttributeValue::N(bid.bidding_amount.to_string()),
    );
    if let Some(deadline) = &bid.bidder_deadline {
        item.insert("bidderDeadline".into(), AttributeValue::S(deadline.clone()));
    }
    if let Some(comment) = &bid.comment {
        item.insert("comment".into(), AttributeValue::S(comment.clone()));
    }
    item.insert(
        "status".into(),
        AttributeValue::S(bid.status.as_str().to_string()),
    );
    item.insert(
        "bidPlacedAt".into(),
        AttributeValue::S(bid.bid_placed_at.to_rfc3339()),
    );
    item
}

fn bid_from_item(item: &Item) -> Option<Bid> {
    Some(Bid {
        id: string(item, "id")?,
        task_id: string(item, "taskId").unwrap_or_default(),
        bidder_email: string(item, "bidderEmail").unwrap_or_default(),
        bidding_amount: number(item, "biddingAmount").unwrap_or_default(),
        bidder_deadline: string(item, "bidderDeadline"),
        comment: string(item, "comment"),
        status: BidStatus::Pending,
        bid_placed_at: timestamp(item, "bidPlacedAt").unwrap_or_default(),
    })
}

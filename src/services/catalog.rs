use crate::{
    entities::{
        branch::{self, Entity as Branch},
        category::{self, Entity as Category},
        item::{self, Entity as Item},
    },
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Categories and branches. Plain CRUD; deletes are refused while items
/// still reference the row.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        name: String,
        description: Option<String>,
    ) -> Result<category::Model, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Category name must not be empty".into(),
            ));
        }
        let existing = Category::find()
            .filter(category::Column::Name.eq(name.clone()))
            .one(self.db.as_ref())
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Category '{}' already exists",
                name
            )));
        }

        let model = category::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            description: Set(description),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        Ok(model.insert(self.db.as_ref()).await?)
    }

    pub async fn get_category(&self, category_id: Uuid) -> Result<category::Model, ServiceError> {
        Category::find_by_id(category_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Category {} not found", category_id)))
    }

    pub async fn list_categories(&self) -> Result<Vec<category::Model>, ServiceError> {
        Ok(Category::find()
            .order_by_asc(category::Column::Name)
            .all(self.db.as_ref())
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn update_category(
        &self,
        category_id: Uuid,
        name: Option<String>,
        description: Option<Option<String>>,
    ) -> Result<category::Model, ServiceError> {
        let found = self.get_category(category_id).await?;

        if let Some(new_name) = &name {
            if new_name.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Category name must not be empty".into(),
                ));
            }
            if new_name != &found.name {
                let taken = Category::find()
                    .filter(category::Column::Name.eq(new_name.clone()))
                    .one(self.db.as_ref())
                    .await?;
                if taken.is_some() {
                    return Err(ServiceError::Conflict(format!(
                        "Category '{}' already exists",
                        new_name
                    )));
                }
            }
        }

        let mut active: category::ActiveModel = found.into();
        if let Some(new_name) = name {
            active.name = Set(new_name);
        }
        if let Some(description) = description {
            active.description = Set(description);
        }
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(self.db.as_ref()).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_category(&self, category_id: Uuid) -> Result<(), ServiceError> {
        let found = self.get_category(category_id).await?;
        let referencing = Item::find()
            .filter(item::Column::CategoryId.eq(category_id))
            .count(self.db.as_ref())
            .await?;
        if referencing > 0 {
            return Err(ServiceError::Conflict(format!(
                "Category '{}' is still assigned to {} item(s)",
                found.name, referencing
            )));
        }
        found.delete(self.db.as_ref()).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn create_branch(
        &self,
        name: String,
        address: Option<String>,
        phone: Option<String>,
    ) -> Result<branch::Model, ServiceError> {
        if name.trim().is_empty() {
            return Err(ServiceError::ValidationError(
                "Branch name must not be empty".into(),
            ));
        }
        let existing = Branch::find()
            .filter(branch::Column::Name.eq(name.clone()))
            .one(self.db.as_ref())
            .await?;
        if existing.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Branch '{}' already exists",
                name
            )));
        }

        let model = branch::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            address: Set(address),
            phone: Set(phone),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        };
        Ok(model.insert(self.db.as_ref()).await?)
    }

    pub async fn get_branch(&self, branch_id: Uuid) -> Result<branch::Model, ServiceError> {
        Branch::find_by_id(branch_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Branch {} not found", branch_id)))
    }

    pub async fn list_branches(&self) -> Result<Vec<branch::Model>, ServiceError> {
        Ok(Branch::find()
            .order_by_asc(branch::Column::Name)
            .all(self.db.as_ref())
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn update_branch(
        &self,
        branch_id: Uuid,
        name: Option<String>,
        address: Option<Option<String>>,
        phone: Option<Option<String>>,
    ) -> Result<branch::Model, ServiceError> {
        let found = self.get_branch(branch_id).await?;

        if let Some(new_name) = &name {
            if new_name.trim().is_empty() {
                return Err(ServiceError::ValidationError(
                    "Branch name must not be empty".into(),
                ));
            }
            if new_name != &found.name {
                let taken = Branch::find()
                    .filter(branch::Column::Name.eq(new_name.clone()))
                    .one(self.db.as_ref())
                    .await?;
                if taken.is_some() {
                    return Err(ServiceError::Conflict(format!(
                        "Branch '{}' already exists",
                        new_name
                    )));
                }
            }
        }

        let mut active: branch::ActiveModel = found.into();
        if let Some(new_name) = name {
            active.name = Set(new_name);
        }
        if let Some(address) = address {
            active.address = Set(address);
        }
        if let Some(phone) = phone {
            active.phone = Set(phone);
        }
        active.updated_at = Set(Some(Utc::now()));
        Ok(active.update(self.db.as_ref()).await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_branch(&self, branch_id: Uuid) -> Result<(), ServiceError> {
        let found = self.get_branch(branch_id).await?;
        let referencing = Item::find()
            .filter(item::Column::BranchId.eq(branch_id))
            .count(self.db.as_ref())
            .await?;
        if referencing > 0 {
            return Err(ServiceError::Conflict(format!(
                "Branch '{}' is still assigned to {} item(s)",
                found.name, referencing
            )));
        }
        found.delete(self.db.as_ref()).await?;
        Ok(())
    }
}

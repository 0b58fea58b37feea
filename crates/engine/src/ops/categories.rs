use uuid::Uuid;

use crate::{Category, EngineError, ResultEngine, util::normalize_required_name};

use super::{Engine, with_tx};

impl Engine {
    /// Return the category called `name`, creating it when missing.
    pub async fn add_category(&self, name: &str) -> ResultEngine<Category> {
        let name = normalize_required_name(name, "category")?;

        with_tx!(self, catalog, |tx| {
            if let Some(existing) = tx.category_by_name(&name).await? {
                return Ok(existing);
            }
            let category = Category::new(name.clone());
            tx.insert_category(&category).await?;
            tracing::debug!(category_id = %category.id, name = %category.name, "category created");
            Ok(category)
        })
    }

    /// Rename a category. Taking the name of another category is rejected.
    pub async fn rename_category(&self, category_id: Uuid, name: &str) -> ResultEngine<Category> {
        let name = normalize_required_name(name, "category")?;

        with_tx!(self, catalog, |tx| {
            let mut category = tx
                .category(category_id)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))?;
            match tx.category_by_name(&name).await? {
                Some(other) if other.id != category_id => {
                    return Err(EngineError::ExistingKey(name.clone()));
                }
                Some(_) => return Ok(category),
                None => {}
            }
            category.name = name.clone();
            tx.update_category(&category).await?;
            Ok(category)
        })
    }

    /// Every category, sorted by name.
    pub async fn categories(&self) -> ResultEngine<Vec<Category>> {
        with_tx!(self, |tx| tx.categories().await)
    }
}

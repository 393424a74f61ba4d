//! Project budgets: projects, supplier quotes and their line items.

use std::fmt;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::model::{CellValue, Dataset, Record, DEFAULT_CATEGORY_THRESHOLD};
use crate::data::normalize::normalize;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BudgetError {
    #[error("project name must not be empty")]
    EmptyProjectName,
    #[error("project '{0}' already exists")]
    DuplicateProject(String),
    #[error("unknown project '{0}'")]
    UnknownProject(String),
    #[error("quote name must not be empty")]
    EmptyQuoteName,
    #[error("quote '{quote}' already exists in project '{project}'")]
    DuplicateQuote { project: String, quote: String },
    #[error("unknown quote '{quote}' in project '{project}'")]
    UnknownQuote { project: String, quote: String },
    #[error("item name must not be empty")]
    EmptyItem,
    #[error("'{0}' is not in the item catalogue")]
    UnknownItem(String),
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    #[error("unit price must be a non-negative number, got {0}")]
    InvalidPrice(f64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectKind {
    EmergencyHouse,
    CommunityCenter,
    Garden,
    WaterTower,
    Other,
}

impl fmt::Display for ProjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ProjectKind::EmergencyHouse => "Emergency house",
            ProjectKind::CommunityCenter => "Community center",
            ProjectKind::Garden => "Garden",
            ProjectKind::WaterTower => "Water tower",
            ProjectKind::Other => "Other",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetItem {
    pub item: String,
    pub quantity: u32,
    pub unit_price: f64,
}

impl BudgetItem {
    pub fn total(&self) -> f64 {
        self.quantity as f64 * self.unit_price
    }
}

/// A supplier quote for a project, e.g. one hardware store's prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    pub name: String,
    #[serde(default)]
    pub items: Vec<BudgetItem>,
}

impl Quote {
    pub fn total(&self) -> f64 {
        self.items.iter().map(BudgetItem::total).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub kind: ProjectKind,
    pub community: String,
    pub responsible: String,
    #[serde(default)]
    pub quotes: Vec<Quote>,
}

impl Project {
    pub fn new(name: &str, kind: ProjectKind, community: &str, responsible: &str) -> Self {
        Project {
            name: name.trim().to_string(),
            kind,
            community: community.trim().to_string(),
            responsible: responsible.trim().to_string(),
            quotes: Vec::new(),
        }
    }

    pub fn quote(&self, name: &str) -> Option<&Quote> {
        self.quotes.iter().find(|q| q.name == name)
    }

    /// Sum over every quote of the project.
    pub fn total(&self) -> f64 {
        self.quotes.iter().map(Quote::total).sum()
    }
}

/// All registered projects, persisted as a JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectRegistry {
    #[serde(default)]
    pub projects: Vec<Project>,
    /// Items a quote may list. Empty means any item name is accepted.
    #[serde(default)]
    pub catalogue: Vec<String>,
}

impl ProjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let text = serde_json::to_string_pretty(self).context("serializing projects")?;
        std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
    }

    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.name == name)
    }

    /// Add `item` to the catalogue; a name already there (ignoring case and
    /// accents) is left alone.
    pub fn add_catalogue_item(&mut self, item: &str) -> Result<(), BudgetError> {
        let item = item.trim();
        if item.is_empty() {
            return Err(BudgetError::EmptyItem);
        }
        if self.catalogue_item(item).is_none() {
            self.catalogue.push(item.to_string());
        }
        Ok(())
    }

    /// Replace the catalogue, e.g. with the distinct values of an items sheet.
    pub fn set_catalogue<I, S>(&mut self, items: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.catalogue.clear();
        for item in items {
            if self.add_catalogue_item(item.as_ref()).is_err() {
                log::debug!("skipping blank catalogue entry");
            }
        }
        log::debug!("item catalogue holds {} entries", self.catalogue.len());
    }

    /// The catalogue spelling of `item`, compared by normalized form.
    pub fn catalogue_item(&self, item: &str) -> Option<&str> {
        let wanted = normalize(item);
        self.catalogue
            .iter()
            .find(|entry| normalize(entry) == wanted)
            .map(String::as_str)
    }

    pub fn add_project(&mut self, project: Project) -> Result<(), BudgetError> {
        if project.name.is_empty() {
            return Err(BudgetError::EmptyProjectName);
        }
        if self.project(&project.name).is_some() {
            return Err(BudgetError::DuplicateProject(project.name));
        }
        log::info!("project '{}' registered", project.name);
        self.projects.push(project);
        Ok(())
    }

    pub fn add_quote(&mut self, project: &str, quote: &str) -> Result<(), BudgetError> {
        let quote = quote.trim();
        if quote.is_empty() {
            return Err(BudgetError::EmptyQuoteName);
        }
        let p = self.project_mut(project)?;
        if p.quote(quote).is_some() {
            return Err(BudgetError::DuplicateQuote {
                project: project.to_string(),
                quote: quote.to_string(),
            });
        }
        p.quotes.push(Quote {
            name: quote.to_string(),
            items: Vec::new(),
        });
        Ok(())
    }

    pub fn add_item(
        &mut self,
        project: &str,
        quote: &str,
        item: &str,
        quantity: u32,
        unit_price: f64,
    ) -> Result<(), BudgetError> {
        let item = item.trim();
        if item.is_empty() {
            return Err(BudgetError::EmptyItem);
        }
        let item = if self.catalogue.is_empty() {
            item.to_string()
        } else {
            self.catalogue_item(item)
                .ok_or_else(|| BudgetError::UnknownItem(item.to_string()))?
                .to_string()
        };
        if quantity == 0 {
            return Err(BudgetError::InvalidQuantity);
        }
        if !unit_price.is_finite() || unit_price < 0.0 {
            return Err(BudgetError::InvalidPrice(unit_price));
        }
        let q = self
            .project_mut(project)?
            .quotes
            .iter_mut()
            .find(|q| q.name == quote)
            .ok_or_else(|| BudgetError::UnknownQuote {
                project: project.to_string(),
                quote: quote.to_string(),
            })?;
        q.items.push(BudgetItem {
            item,
            quantity,
            unit_price,
        });
        Ok(())
    }

    pub fn project_total(&self, project: &str) -> Option<f64> {
        self.project(project).map(Project::total)
    }

    pub fn quote_total(&self, project: &str, quote: &str) -> Option<f64> {
        self.project(project)?.quote(quote).map(Quote::total)
    }

    /// Every line item as a row, so budgets can go through the filter engine.
    pub fn items_dataset(&self) -> Dataset {
        let columns = ["project", "quote", "item", "quantity", "unit_price", "total"];
        let records = self
            .projects
            .iter()
            .flat_map(|p| p.quotes.iter().map(move |q| (p, q)))
            .flat_map(|(p, q)| q.items.iter().map(move |i| (p, q, i)))
            .map(|(p, q, i)| {
                Record::new()
                    .with("project", p.name.as_str())
                    .with("quote", q.name.as_str())
                    .with("item", i.item.as_str())
                    .with("quantity", CellValue::Integer(i.quantity as i64))
                    .with("unit_price", i.unit_price)
                    .with("total", i.total())
            })
            .collect();
        Dataset::new(
            columns.iter().map(|c| c.to_string()).collect(),
            records,
            DEFAULT_CATEGORY_THRESHOLD,
        )
    }

    fn project_mut(&mut self, name: &str) -> Result<&mut Project, BudgetError> {
        self.projects
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| BudgetError::UnknownProject(name.to_string()))
    }
}

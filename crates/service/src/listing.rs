//! Management listing of host entities with their extended info status.

use std::collections::HashSet;
use std::str::FromStr;

use models::InstanceKind;
use serde::{Deserialize, Serialize};

use crate::directory::EntityDirectory;
use crate::errors::ServiceError;
use crate::extended_info::repository::ExtendedInfoRepository;
use crate::pagination::Pagination;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortColumn {
    #[default]
    Id,
    Name,
}

impl FromStr for SortColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "name" => Ok(Self::Name),
            other => Err(format!("unknown sort column `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortDir {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unknown sort direction `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListingQuery {
    /// Category filter for course listings.
    pub catid: Option<i64>,
    /// Course filter for module listings.
    pub cid: Option<i64>,
    pub sort: SortColumn,
    pub dir: SortDir,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingRow {
    pub id: i64,
    pub name: String,
    pub module: Option<String>,
    pub has_info: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListingPage {
    pub rows: Vec<ListingRow>,
    pub total: usize,
    pub page: u32,
    pub per_page: u32,
}

/// List live entities of a kind, flagging those that have extended info.
pub async fn list_targets(
    directory: &dyn EntityDirectory,
    repo: &dyn ExtendedInfoRepository,
    kind: InstanceKind,
    query: &ListingQuery,
) -> Result<ListingPage, ServiceError> {
    let parent = match kind {
        InstanceKind::Category => None,
        InstanceKind::Course => query.catid,
        InstanceKind::Module => query.cid,
        InstanceKind::Dashboard => return Err(ServiceError::InvalidTarget("dashboard has no listing".into())),
    };
    let entities = directory.list(kind, parent).await?;
    let with_info: HashSet<i64> = repo
        .list_by_instance(kind)
        .await?
        .into_iter()
        .map(|r| r.context_instance_id)
        .collect();

    let mut rows: Vec<ListingRow> = entities
        .into_iter()
        .map(|e| ListingRow { has_info: with_info.contains(&e.id), id: e.id, name: e.name, module: e.module })
        .collect();
    match query.sort {
        SortColumn::Id => rows.sort_by_key(|r| r.id),
        // byte-wise and case-sensitive
        SortColumn::Name => rows.sort_by_cached_key(|r| (r.name.trim().to_string(), r.id)),
    }
    if query.dir == SortDir::Desc {
        rows.reverse();
    }

    let total = rows.len();
    let p = query.pagination.normalize();
    Ok(ListingPage { rows: p.apply(rows), total, page: p.page, per_page: p.per_page })
}

//! Settings button shown to site administrators on host pages.

use models::{InstanceKind, NO_INSTANCE};
use serde::{Deserialize, Serialize};
use url::Url;

/// Host page layout names that carry an extended info target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageLayout {
    CourseCategory,
    Course,
    FrontPage,
    InCourse,
    MyDashboard,
    Admin,
    Other(String),
}

impl From<&str> for PageLayout {
    fn from(s: &str) -> Self {
        match s {
            "coursecategory" => Self::CourseCategory,
            "course" => Self::Course,
            "frontpage" => Self::FrontPage,
            "incourse" => Self::InCourse,
            "mydashboard" => Self::MyDashboard,
            "admin" => Self::Admin,
            other => Self::Other(other.to_string()),
        }
    }
}

/// What the host knows about the page being rendered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageContext {
    pub layout: PageLayout,
    pub category_id: Option<i64>,
    pub course_id: Option<i64>,
    pub cm_id: Option<i64>,
    /// Current page URL, used as the return address of the edit page.
    pub url: String,
    pub is_site_admin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SettingsTarget {
    pub instance: InstanceKind,
    pub context_instance_id: i64,
}

fn id_or_unset(id: Option<i64>) -> i64 {
    id.filter(|id| *id > 0).unwrap_or(NO_INSTANCE)
}

/// Target edited from this page, if any. Only site administrators get one.
pub fn settings_target(page: &PageContext) -> Option<SettingsTarget> {
    if !page.is_site_admin {
        return None;
    }
    let (instance, context_instance_id) = match page.layout {
        PageLayout::CourseCategory => (InstanceKind::Category, id_or_unset(page.category_id)),
        PageLayout::Course | PageLayout::FrontPage => (InstanceKind::Course, id_or_unset(page.course_id)),
        PageLayout::InCourse => (InstanceKind::Module, page.cm_id.filter(|id| *id > 0)?),
        PageLayout::MyDashboard => (InstanceKind::Dashboard, NO_INSTANCE),
        PageLayout::Admin | PageLayout::Other(_) => return None,
    };
    Some(SettingsTarget { instance, context_instance_id })
}

/// Edit page URL for a target, returning to `return_url` afterwards.
pub fn edit_url(wwwroot: &str, target: SettingsTarget, return_url: &str) -> Result<Url, url::ParseError> {
    let mut url = Url::parse(&format!("{}/local/extendedinfo/edit.php", wwwroot.trim_end_matches('/')))?;
    url.query_pairs_mut()
        .append_pair("instance", target.instance.as_str())
        .append_pair("contextinstanceid", &target.context_instance_id.to_string())
        .append_pair("returnurl", return_url);
    Ok(url)
}

/// Button HTML for the page, or an empty string when there is nothing to edit.
pub fn settings_button(page: &PageContext, wwwroot: &str) -> Result<String, url::ParseError> {
    let Some(target) = settings_target(page) else {
        return Ok(String::new());
    };
    let href = edit_url(wwwroot, target, &page.url)?;
    Ok(format!(
        r#"<div class="extendedinfo-btn"><a class="btn btn-primary" href="{}"><i class="fa fa-list-alt"></i> Extended Info</a></div>"#,
        html_escape::encode_double_quoted_attribute(href.as_str())
    ))
}

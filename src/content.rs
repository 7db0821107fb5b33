//! Read models and queries over the published content (categories, blog
//! posts, projects, services). Shared by the HTML pages, the public JSON
//! API and the admin API.

mod blogs;
mod categories;
mod projects;
mod services;

pub use blogs::{
    Blog, BlogFilter, find_blog_by_id, find_published_blog_by_slug, list_blogs, similar_blogs,
};
pub use categories::{
    Category, CategoryWithCount, find_category_by_id, list_categories, list_categories_with_counts,
};
pub use projects::{
    Project, ProjectFilter, find_project_by_id, find_published_project_by_slug, list_projects,
};
pub use services::{Service, find_service_by_slug, list_services};

/// `%term%` for `ILIKE`, with the wildcard characters of `term` escaped.
pub fn like_pattern(term: &str) -> String {
    let escaped = term
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Blank query-string values mean "no filter".
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

use super::repo_types::{Category, UserCategories};

/// Case-insensitive substring match on the trimmed name, keeping order.
pub fn search_by_name(categories: &[Category], query: &str) -> Vec<Category> {
    let needle = query.trim().to_lowercase();
    categories
        .iter()
        .filter(|c| c.name.trim().to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

/// Buckets categories by owner; owners appear in order of their first category.
pub fn group_by_user(categories: Vec<Category>) -> Vec<UserCategories> {
    let mut groups: Vec<UserCategories> = Vec::new();
    for category in categories {
        match groups.iter_mut().find(|g| g.user_id == category.user_id) {
            Some(group) => group.categories.push(category),
            None => groups.push(UserCategories {
                user_id: category.user_id,
                categories: vec![category],
            }),
        }
    }
    groups
}

use pb_core::{DateWindow, RecordStore, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowStats {
    pub window: DateWindow,
    pub total: u64,
    pub per_category: Vec<(String, u64)>,
}

/// Record counts for `window`, overall and per category.
pub async fn window_stats(store: &dyn RecordStore, window: &DateWindow, categories: &[String]) -> Result<WindowStats> {
    let total = store.count_window(window, categories).await?;
    let mut per_category = Vec::with_capacity(categories.len());
    for category in categories {
        let count = store.count_window(window, std::slice::from_ref(category)).await?;
        per_category.push((category.clone(), count));
    }
    Ok(WindowStats {
        window: *window,
        total,
        per_category,
    })
}

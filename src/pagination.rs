//! Generic page-at-a-time list container.
//!
//! A [`PaginationView`] owns the paging state of one list and knows nothing
//! about what it lists: it calls a `fetch(page, page_size)` function and hands
//! the resulting items to caller-supplied render functions.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::constants::*;
use crate::models::Page;
use crate::utils::page_count;

/// One fetched page as reported by the data source.
#[derive(Debug, Clone, PartialEq)]
pub struct PageData<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub pages: u32,
    pub page: u32,
}

impl<T> From<Page<T>> for PageData<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            items: page.items,
            total: page.total,
            pages: page.pages,
            page: page.page,
        }
    }
}

/// Boxed fetch future, for sources that cannot name their future type.
pub type BoxedPageFuture<T> = Pin<Box<dyn Future<Output = Result<PageData<T>, String>> + Send>>;

#[derive(Debug, Clone)]
pub struct PaginationOptions {
    pub initial_page: u32,
    pub initial_page_size: u32,
    pub page_size_options: Vec<u32>,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            initial_page: DEFAULT_PAGE,
            initial_page_size: DEFAULT_PAGE_SIZE,
            page_size_options: PAGE_SIZE_OPTIONS.to_vec(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    Idle,
    Loading,
    Loaded,
    Errored(String),
}

/// Copy of the observable state.
#[derive(Debug, Clone, PartialEq)]
pub struct PageSnapshot<T> {
    pub current_page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub items: Vec<T>,
    pub status: LoadStatus,
}

/// What a list should display right now.
#[derive(Debug, Clone, PartialEq)]
pub enum PageView<R> {
    Loading,
    Error(String),
    Content(R),
    /// Produced by the caller's empty renderer.
    Empty(R),
    /// No items exist at all.
    NoData,
    /// Items exist, but not on this page (e.g. the page went stale after a delete).
    PageEmpty { total_items: u64 },
}

struct PageState<T> {
    current_page: u32,
    page_size: u32,
    total_items: u64,
    total_pages: u32,
    items: Vec<T>,
    status: LoadStatus,
    loaded_once: bool,
    dependencies: Vec<String>,
}

pub struct PaginationView<T, F> {
    fetch: F,
    options: PaginationOptions,
    state: Mutex<PageState<T>>,
    latest_request: AtomicU64,
}

impl<T, F, Fut> PaginationView<T, F>
where
    T: Clone,
    F: Fn(u32, u32) -> Fut,
    Fut: Future<Output = Result<PageData<T>, String>>,
{
    pub fn new(fetch: F, options: PaginationOptions) -> Self {
        let state = PageState {
            current_page: options.initial_page.max(1),
            page_size: options.initial_page_size.max(1),
            total_items: 0,
            total_pages: 0,
            items: Vec::new(),
            status: LoadStatus::Idle,
            loaded_once: false,
            dependencies: Vec::new(),
        };
        Self {
            fetch,
            options,
            state: Mutex::new(state),
            latest_request: AtomicU64::new(0),
        }
    }

    fn state(&self) -> MutexGuard<'_, PageState<T>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn page_size_options(&self) -> &[u32] {
        &self.options.page_size_options
    }

    pub fn snapshot(&self) -> PageSnapshot<T> {
        let state = self.state();
        PageSnapshot {
            current_page: state.current_page,
            page_size: state.page_size,
            total_items: state.total_items,
            total_pages: state.total_pages,
            items: state.items.clone(),
            status: state.status.clone(),
        }
    }

    /// Fetches `(page, size)` and applies the result unless a newer fetch was
    /// issued meanwhile.
    async fn fetch_into(&self, page: u32, size: u32) {
        let ticket = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state();
            state.current_page = page;
            state.page_size = size;
            state.status = LoadStatus::Loading;
        }

        let result = (self.fetch)(page, size).await;

        if self.latest_request.load(Ordering::SeqCst) != ticket {
            tracing::debug!(page, size, ticket, "dropping stale page response");
            return;
        }

        let mut state = self.state();
        match result {
            Ok(data) => {
                state.total_items = data.total;
                state.total_pages = page_count(data.total, size);
                state.items = data.items;
                state.status = LoadStatus::Loaded;
                state.loaded_once = true;
            }
            Err(message) => {
                tracing::debug!(page, size, %message, "page fetch failed");
                state.items.clear();
                state.status = LoadStatus::Errored(message);
            }
        }
    }

    /// (Re)loads the current page.
    pub async fn load(&self) {
        let (page, size) = {
            let state = self.state();
            (state.current_page, state.page_size)
        };
        self.fetch_into(page, size).await;
    }

    /// Navigates to `page`. Once a load has completed the target is clamped to
    /// `[1, max(1, total_pages)]`; page 0 is ignored.
    pub async fn go_to_page(&self, page: u32) {
        if page == 0 {
            return;
        }
        let (target, size) = {
            let state = self.state();
            let target = if state.loaded_once {
                page.min(state.total_pages.max(1))
            } else {
                page
            };
            (target, state.page_size)
        };
        self.fetch_into(target, size).await;
    }

    pub async fn next_page(&self) {
        let current = self.state().current_page;
        self.go_to_page(current.saturating_add(1)).await;
    }

    pub async fn prev_page(&self) {
        let current = self.state().current_page;
        if current > 1 {
            self.go_to_page(current - 1).await;
        }
    }

    /// Changes the page size; always goes back to page 1.
    pub async fn set_page_size(&self, size: u32) {
        if size == 0 {
            return;
        }
        self.fetch_into(1, size).await;
    }

    /// Refetches the current page when `dependencies` differ from the last ones seen.
    /// Returns whether a fetch happened.
    pub async fn set_dependencies(&self, dependencies: Vec<String>) -> bool {
        {
            let mut state = self.state();
            if state.dependencies == dependencies {
                return false;
            }
            state.dependencies = dependencies;
        }
        self.load().await;
        true
    }

    /// Renders with the default empty placeholders.
    pub fn render<R>(&self, render_content: impl FnOnce(&[T], bool) -> R) -> PageView<R> {
        let state = self.state();
        match &state.status {
            LoadStatus::Errored(message) => PageView::Error(message.clone()),
            LoadStatus::Idle => PageView::Loading,
            LoadStatus::Loading if state.items.is_empty() => PageView::Loading,
            status => {
                let loading = *status == LoadStatus::Loading;
                if !state.items.is_empty() {
                    PageView::Content(render_content(&state.items, loading))
                } else if state.total_items == 0 {
                    PageView::NoData
                } else {
                    PageView::PageEmpty {
                        total_items: state.total_items,
                    }
                }
            }
        }
    }

    /// Renders, delegating both empty cases to `render_empty(total_items)`.
    pub fn render_with_empty<R>(
        &self,
        render_content: impl FnOnce(&[T], bool) -> R,
        render_empty: impl FnOnce(u64) -> R,
    ) -> PageView<R> {
        match self.render(render_content) {
            PageView::NoData => PageView::Empty(render_empty(0)),
            PageView::PageEmpty { total_items } => PageView::Empty(render_empty(total_items)),
            other => other,
        }
    }
}

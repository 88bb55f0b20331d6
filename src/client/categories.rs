use reqwest::Method;

use crate::client::http::{ClientError, ClientResult, HttpClient, to_body};
use crate::constants::*;
use crate::models::{
    Category, CategoryNode, CategoryQuery, CreateCategoryPayload, Page, UpdateCategoryPayload,
};
use crate::pagination::{BoxedPageFuture, PageData};

const CATEGORIES_PATH: &str = "/categories/";

fn query_params(filters: &CategoryQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(flat) = filters.flat {
        params.push(("flat", flat.to_string()));
    }
    if let Some(page) = filters.page {
        params.push(("page", page.to_string()));
    }
    if let Some(size) = filters.size {
        params.push(("size", size.to_string()));
    }
    params
}

/// Category CRUD over the authenticated request primitive.
#[derive(Clone)]
pub struct CategoryApiClient {
    http: HttpClient,
}

impl CategoryApiClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    /// Lists categories. Flat listings come back as nodes without children.
    pub async fn get_categories(&self, filters: &CategoryQuery) -> ClientResult<Page<CategoryNode>> {
        self.http
            .make_request(Method::GET, CATEGORIES_PATH, &query_params(filters), None)
            .await
    }

    pub async fn get_category(&self, id: i64) -> ClientResult<Category> {
        self.http
            .make_request(Method::GET, &format!("/categories/{}", id), &[], None)
            .await
    }

    pub async fn create_category(&self, payload: &CreateCategoryPayload) -> ClientResult<Category> {
        let body = to_body(payload)?;
        self.http
            .make_request(Method::POST, CATEGORIES_PATH, &[], Some(body))
            .await
    }

    pub async fn update_category(
        &self,
        id: i64,
        payload: &UpdateCategoryPayload,
    ) -> ClientResult<Category> {
        let body = to_body(payload)?;
        self.http
            .make_request(Method::PUT, &format!("/categories/{}", id), &[], Some(body))
            .await
    }

    pub async fn delete_category(&self, id: i64) -> ClientResult<()> {
        self.http
            .make_request_empty(Method::DELETE, &format!("/categories/{}", id), None)
            .await
    }

    /// Every category of the current user as one flat list (first
    /// `FLAT_LIST_PAGE_SIZE` entries), for parent pickers and depth checks.
    pub async fn get_all_categories_flat(&self) -> ClientResult<Vec<Category>> {
        let filters = CategoryQuery {
            flat: Some(true),
            page: None,
            size: Some(FLAT_LIST_PAGE_SIZE),
        };
        let page: Option<Page<CategoryNode>> = match self
            .http
            .make_request(Method::GET, CATEGORIES_PATH, &query_params(&filters), None)
            .await
        {
            Ok(page) => page,
            // Empty and unreadable bodies read the same to the caller
            Err(ClientError::Decode { message }) => {
                tracing::debug!(%message, "flat category list undecodable");
                None
            }
            Err(e) => return Err(e),
        };

        let page = page.ok_or_else(|| ClientError::Decode {
            message: ERR_NO_CATEGORIES_DATA.to_string(),
        })?;
        Ok(page.items.into_iter().map(|node| node.category).collect())
    }

    /// A fetch function for [`crate::pagination::PaginationView`] over this client.
    pub fn page_fetcher(
        &self,
        flat: bool,
    ) -> impl Fn(u32, u32) -> BoxedPageFuture<CategoryNode> + Send + Sync + 'static {
        let client = self.clone();
        move |page, size| {
            let client = client.clone();
            let fut: BoxedPageFuture<CategoryNode> = Box::pin(async move {
                let filters = CategoryQuery {
                    flat: Some(flat),
                    page: Some(page),
                    size: Some(size),
                };
                client
                    .get_categories(&filters)
                    .await
                    .map(PageData::from)
                    .map_err(|e| e.message().to_string())
            });
            fut
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_params_skip_unset_filters() {
        assert!(query_params(&CategoryQuery::default()).is_empty());
        let params = query_params(&CategoryQuery {
            flat: Some(true),
            page: None,
            size: Some(100),
        });
        assert_eq!(
            params,
            vec![("flat", "true".to_string()), ("size", "100".to_string())]
        );
    }
}

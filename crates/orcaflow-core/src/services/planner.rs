use tracing::debug;

use crate::api::{ApiClient, ApiError, Empty};
use crate::models::{GetPostsParams, GetPostsResponse, NewPost, PostUpdate, ScheduledPost};

/// Content planner endpoints. Errors are passed through untouched.
#[derive(Clone)]
pub struct PlannerService {
    client: ApiClient,
}

impl PlannerService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list_posts(&self, params: &GetPostsParams) -> Result<GetPostsResponse, ApiError> {
        let query = params.query_pairs();
        debug!(?query, "Fetching posts");
        if query.is_empty() {
            self.client.get("/posts").await
        } else {
            self.client.get_query("/posts", &query).await
        }
    }

    pub async fn get_post(&self, id: i64) -> Result<ScheduledPost, ApiError> {
        self.client.get(&format!("/posts/{}", id)).await
    }

    pub async fn create_post(&self, post: &NewPost) -> Result<ScheduledPost, ApiError> {
        self.client.post("/planner/posts", post).await
    }

    pub async fn update_post(&self, id: i64, update: &PostUpdate) -> Result<ScheduledPost, ApiError> {
        self.client.put(&format!("/planner/posts/{}", id), update).await
    }

    pub async fn delete_post(&self, id: i64) -> Result<(), ApiError> {
        self.client
            .delete::<Empty>(&format!("/planner/posts/{}", id))
            .await
            .map(|_| ())
    }
}

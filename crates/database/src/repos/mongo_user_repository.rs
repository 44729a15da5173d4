//! MongoDB user adapter.

use crate::connection::MongoProvider;
use crate::entities::{CreateUserRequest, User, UserId};
use crate::schema::USERS;
use crate::types::{UserError, UserResult};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, DateTime, Document};
use mongodb::options::FindOneOptions;
use mongodb::Collection;
use serde::Deserialize;
use tracing::debug;

/// Stored user as read back with the credential projected out.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    username: String,
    email: String,
    full_name: String,
    created_at: DateTime,
    updated_at: DateTime,
}

impl From<UserDocument> for User {
    fn from(document: UserDocument) -> Self {
        Self {
            id: UserId::Object(document.id.to_hex()),
            username: document.username,
            email: document.email,
            full_name: document.full_name,
            created_at: document.created_at.to_chrono(),
            updated_at: document.updated_at.to_chrono(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IdDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
}

/// Repository for users stored in a MongoDB collection
#[derive(Clone)]
pub struct MongoUserRepository {
    provider: MongoProvider,
}

impl MongoUserRepository {
    pub fn new(provider: MongoProvider) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &MongoProvider {
        &self.provider
    }

    fn users<T: Send + Sync>(&self) -> Collection<T> {
        self.provider.collection(USERS)
    }

    /// Insert the user, then read it back by the generated ObjectId with the
    /// credential excluded.
    pub async fn create(&self, request: &CreateUserRequest) -> UserResult<User> {
        let request = request.normalized();
        let now = DateTime::now();

        let document = doc! {
            "username": request.username.as_str(),
            "email": request.email.as_str(),
            "fullName": request.full_name.as_str(),
            "password": request.password.expose(),
            "createdAt": now,
            "updatedAt": now,
        };

        let result = self.users::<Document>().insert_one(document, None).await?;
        let id = result
            .inserted_id
            .as_object_id()
            .ok_or(UserError::CreateFailed)?;
        debug!(id = %id, "mongodb user inserted");

        self.fetch_by_object_id(id)
            .await?
            .ok_or(UserError::CreateFailed)
    }

    /// Find user by ID. Anything that is not a 24-char hex ObjectId is
    /// rejected before touching the server.
    pub async fn find_by_id(&self, id: &str) -> UserResult<Option<User>> {
        let id = id.trim();
        if id.is_empty() {
            return Err(UserError::InvalidArgument("user id must not be empty".to_string()));
        }
        let id = ObjectId::parse_str(id)
            .map_err(|_| UserError::InvalidArgument(format!("'{id}' is not a valid user id")))?;

        self.fetch_by_object_id(id).await
    }

    /// Identifier of any user holding either the username or the email.
    pub async fn find_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> UserResult<Option<UserId>> {
        let filter = doc! {
            "$or": [
                { "username": username },
                { "email": email },
            ]
        };
        let options = FindOneOptions::builder()
            .projection(doc! { "_id": 1 })
            .build();

        let found = self
            .users::<IdDocument>()
            .find_one(filter, options)
            .await?;

        Ok(found.map(|document| UserId::Object(document.id.to_hex())))
    }

    pub async fn count(&self) -> UserResult<u64> {
        let count = self.users::<Document>().count_documents(None, None).await?;
        Ok(count)
    }

    async fn fetch_by_object_id(&self, id: ObjectId) -> UserResult<Option<User>> {
        let options = FindOneOptions::builder()
            .projection(doc! { "password": 0 })
            .build();

        let found = self
            .users::<UserDocument>()
            .find_one(doc! { "_id": id }, options)
            .await?;

        Ok(found.map(User::from))
    }
}

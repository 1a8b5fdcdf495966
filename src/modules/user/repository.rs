use crate::infrastructure::Database;
use crate::infrastructure::database::DbResult;
use crate::modules::user::domain::{CreateUserRequest, UpdateUserRequest, User};
use crate::prelude::*;

const USERS: &str = "users";

/// Storage boundary for users. Controllers depend on this trait only.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get(&self, id: &str) -> DbResult<Option<User>>;
    async fn list(&self) -> DbResult<Vec<User>>;
    async fn create(&self, req: CreateUserRequest) -> DbResult<User>;
    async fn update(&self, req: UpdateUserRequest) -> DbResult<Option<User>>;
    async fn delete(&self, id: &str) -> DbResult<bool>;
}

/// Stores users as JSON documents in the `users` collection.
pub struct DocumentUserRepository {
    db: Arc<Database>,
}

impl Injectable for DocumentUserRepository {
    fn inject(container: &Container) -> Result<Self> {
        Ok(Self {
            db: container.resolve::<Database>()?,
        })
    }
}

#[async_trait]
impl UserRepository for DocumentUserRepository {
    async fn get(&self, id: &str) -> DbResult<Option<User>> {
        let users = self.db.collection(USERS)?;
        match users.get(id) {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    async fn list(&self) -> DbResult<Vec<User>> {
        let users = self.db.collection(USERS)?;
        let mut all = users
            .scan()
            .into_iter()
            .map(serde_json::from_value::<User>)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        all.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }

    async fn create(&self, req: CreateUserRequest) -> DbResult<User> {
        let users = self.db.collection(USERS)?;
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            name: req.name,
            email: req.email,
        };
        users.insert(&user.id, serde_json::to_value(&user)?);
        tracing::debug!(user_id = %user.id, "User created");
        Ok(user)
    }

    async fn update(&self, req: UpdateUserRequest) -> DbResult<Option<User>> {
        let users = self.db.collection(USERS)?;
        let Some(doc) = users.get(&req.id) else {
            return Ok(None);
        };
        let mut user: User = serde_json::from_value(doc)?;

        user.apply(req);
        users.insert(&user.id, serde_json::to_value(&user)?);
        Ok(Some(user))
    }

    async fn delete(&self, id: &str) -> DbResult<bool> {
        let users = self.db.collection(USERS)?;
        Ok(users.remove(id).is_some())
    }
}

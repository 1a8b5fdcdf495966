use crate::modules::user::domain::{CreateUserRequest, UpdateUserRequest, User};
use crate::modules::user::repository::UserRepository;
use crate::prelude::*;

type UserResult<T> = std::result::Result<ApiResponse<T>, ApiError>;

pub struct UserController {
    repository: Arc<dyn UserRepository>,
}

impl Injectable for UserController {
    fn inject(container: &Container) -> Result<Self> {
        Ok(Self {
            repository: container.resolve_trait::<dyn UserRepository>()?,
        })
    }
}

impl UserController {
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    pub async fn list(&self) -> UserResult<Vec<User>> {
        let users = self.repository.list().await?;
        Ok(ApiResponse::success(users))
    }

    pub async fn get_one(&self, id: String) -> UserResult<User> {
        self.repository
            .get(&id)
            .await?
            .map(ApiResponse::success)
            .ok_or_else(|| ApiError::not_found(format!("User {} not found", id)))
    }

    pub async fn create(&self, req: CreateUserRequest) -> UserResult<User> {
        let user = self.repository.create(req).await?;
        tracing::info!(user_id = %user.id, "User created");
        Ok(ApiResponse::created(user).with_message("User created"))
    }

    pub async fn update(&self, req: UpdateUserRequest) -> UserResult<User> {
        let id = req.id.clone();
        self.repository
            .update(req)
            .await?
            .map(|user| ApiResponse::success(user).with_message("User updated"))
            .ok_or_else(|| ApiError::not_found(format!("User {} not found", id)))
    }

    pub async fn delete(&self, id: String) -> UserResult<()> {
        if self.repository.delete(&id).await? {
            tracing::info!(user_id = %id, "User deleted");
            Ok(ApiResponse::message("User deleted"))
        } else {
            Err(ApiError::not_found(format!("User {} not found", id)))
        }
    }
}

pub async fn list_users(Inject(controller): Inject<UserController>) -> UserResult<Vec<User>> {
    controller.list().await
}

pub async fn get_user(
    Inject(controller): Inject<UserController>,
    Path(id): Path<String>,
) -> UserResult<User> {
    controller.get_one(id).await
}

pub async fn create_user(
    Inject(controller): Inject<UserController>,
    Payload(req): Payload<CreateUserRequest>,
) -> UserResult<User> {
    controller.create(req).await
}

pub async fn update_user(
    Inject(controller): Inject<UserController>,
    Payload(req): Payload<UpdateUserRequest>,
) -> UserResult<User> {
    controller.update(req).await
}

pub async fn delete_user(
    Inject(controller): Inject<UserController>,
    Path(id): Path<String>,
) -> UserResult<()> {
    controller.delete(id).await
}

use std::sync::Arc;

use userdir_users::UserService;

#[derive(Clone)]
pub struct AppState {
    users: Arc<UserService>,
}

impl AppState {
    pub fn new(users: Arc<UserService>) -> Self {
        Self { users }
    }

    pub fn users(&self) -> &UserService {
        &self.users
    }
}

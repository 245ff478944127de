//! Route paths served by [`crate::router`].

pub const GET_API_HEALTH: &str = "/api/health";
pub const POST_AUTH_LOGIN: &str = "/auth/login";
pub const POST_AUTH_REFRESH: &str = "/auth/refresh";
pub const POST_AUTH_LOGOUT: &str = "/auth/logout";
pub const GET_AUTH_ME: &str = "/auth/me";
pub const GET_USERS_ID: &str = "/users/{id}";
pub const DELETE_ADMIN_CACHE: &str = "/admin/cache";

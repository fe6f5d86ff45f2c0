//! Route paths.

pub const GET_HEALTH: &str = "/health";

pub const POST_AUTH_LOGIN: &str = "/auth/login";
pub const POST_AUTH_REGISTER: &str = "/auth/register";
pub const POST_AUTH_REFRESH: &str = "/auth/refresh";
pub const DELETE_AUTH_LOGOUT: &str = "/auth/logout";
pub const DELETE_AUTH_WITHDRAW: &str = "/auth/withdraw";

pub const COURSES: &str = "/courses";
pub const COURSE: &str = "/courses/{course_id}";
pub const COURSE_WHITELIST: &str = "/courses/{course_id}/whitelist";
pub const COURSE_JOIN: &str = "/courses/{course_id}/join";
pub const COURSE_PROBLEMS: &str = "/courses/{course_id}/problems";
pub const COURSE_PROBLEM: &str = "/courses/{course_id}/problems/{problem_id}";
pub const PROBLEM_ANSWERS: &str = "/courses/{course_id}/problems/{problem_id}/answers";
pub const PROBLEM_SOLUTIONS: &str = "/courses/{course_id}/problems/{problem_id}/solutions";
pub const COURSE_SOLUTIONS: &str = "/courses/{course_id}/solutions";
pub const COURSE_SOLUTION: &str = "/courses/{course_id}/solutions/{solution_id}";

pub const ADMIN_USER_ROLE: &str = "/admin/users/{user_id}/role";

mod test_auth_middleware;
mod test_login_flow;
mod test_password_reset;
mod test_refresh_flow;

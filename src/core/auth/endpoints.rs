/// Remote endpoints the login relay talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthEndpoints {
    pub authorize: String,
    pub token: String,
    pub xbox_user: String,
    pub xsts: String,
    pub game_login: String,
    pub game_profile: String,
}

impl Default for AuthEndpoints {
    fn default() -> Self {
        Self {
            authorize: "https://login.microsoftonline.com/consumers/oauth2/v2.0/authorize".into(),
            token: "https://login.microsoftonline.com/consumers/oauth2/v2.0/token".into(),
            xbox_user: "https://user.auth.xboxlive.com/user/authenticate".into(),
            xsts: "https://xsts.auth.xboxlive.com/xsts/authorize".into(),
            game_login: "https://api.minecraftservices.com/authentication/login_with_xbox".into(),
            game_profile: "https://api.minecraftservices.com/minecraft/profile".into(),
        }
    }
}

impl AuthEndpoints {
    /// Every endpoint on one host, keeping the real paths.
    pub fn under(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            authorize: format!("{base}/oauth2/v2.0/authorize"),
            token: format!("{base}/oauth2/v2.0/token"),
            xbox_user: format!("{base}/user/authenticate"),
            xsts: format!("{base}/xsts/authorize"),
            game_login: format!("{base}/authentication/login_with_xbox"),
            game_profile: format!("{base}/minecraft/profile"),
        }
    }
}

use clap::Parser;
use recipes_types::{claim::Role, config::BackendConfig, general::ValidEmail};

use crate::commands::{create_user_repository, Executor};

#[derive(Parser, Debug)]
pub struct CreateUserCmd {
    #[command(flatten)]
    backend: BackendConfig,
    #[arg(short, long, help = "User name, defaults to email")]
    name: Option<String>,
    #[arg(short, long, help = "User email, used as username")]
    pub email: ValidEmail,
    #[arg(short, long, help = "User password")]
    pub password: String,
    #[arg(short, long, num_args=0..,
        value_delimiter = ',', default_value = Role::ADMIN,
        help = "Roles of the user, comma separated or used multiple times, currently only admin role is supported")]
    pub roles: Vec<Role>,
}

impl Executor for CreateUserCmd {
    async fn run(self) -> anyhow::Result<()> {
        let repository = create_user_repository(&self.backend.database_url()).await?;
        let roles: Vec<String> = self.roles.iter().map(|r| r.as_ref().to_string()).collect();
        let new_user = recipes_dal::user::CreateUser {
            name: self.name,
            email: self.email,
            password: Some(self.password),
            roles: if roles.is_empty() { None } else { Some(roles) },
        };
        let user = repository.create(new_user).await?;
        println!("Created user {} (id {})", user.email, user.id);

        Ok(())
    }
}

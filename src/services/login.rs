use crate::api::DoctolibClient;
use crate::errors::ApiError;
use crate::prompt::Prompter;

const TWO_FACTOR_REDIRECT: &str = "/sessions/two-factor";

// Warm-up, credential login, and the optional email 2FA challenge.
// Ok(false) covers every rejection the operator can fix by retrying or
// correcting input.
pub async fn login(
    client: &DoctolibClient,
    prompter: &dyn Prompter,
    username: &str,
    password: &str,
) -> anyhow::Result<bool> {
    if let Err(err) = client.warm_up().await {
        match err {
            ApiError::Blocked(_) => {
                tracing::error!("request blocked by the anti-bot challenge, try again")
            }
            other => tracing::error!(error = %other, "could not reach the booking service"),
        }
        return Ok(false);
    }

    let reply = match client.login(username, password).await {
        Ok(reply) => reply,
        Err(ApiError::Authentication(_)) => {
            tracing::error!("wrong username or password");
            return Ok(false);
        }
        Err(err) => {
            tracing::error!(error = %err, "login request failed");
            return Ok(false);
        }
    };

    if reply.redirection.as_deref() == Some(TWO_FACTOR_REDIRECT) {
        tracing::info!("requesting a two-factor auth code");
        client.request_auth_code().await?;
        let code = prompter.prompt("Enter auth code")?;
        match client.submit_auth_code(&code).await {
            Ok(()) => {}
            Err(ApiError::NotFound(_)) => {
                tracing::error!("invalid auth code");
                return Ok(false);
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(true)
}

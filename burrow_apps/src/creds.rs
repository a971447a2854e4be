use burrow_client::{
    ClientChannel, ClientError, Condition, Data, HandlerFuture, Record, TokenIssuer,
};
use tracing::error;

pub const USERS_TABLE: &str = "users";

/// Handle one login call.
///
/// Looks up the user by username equality and compares the stored
/// credentials against the supplied ones. A match earns `{ack: true,
/// token}` with a fresh token signed over the stored fields; a mismatch,
/// a missing user, or a failed lookup earns `{ack: false}`. Lookup
/// failures are logged; the caller only ever sees the acknowledgment.
pub async fn login(client: &ClientChannel, issuer: &TokenIssuer, params: &Record) -> Record {
    let username = match params.get("username").and_then(Data::as_str) {
        Some(username) => username,
        None => return ack(false),
    };
    let password = match params.get("password").and_then(Data::as_str) {
        Some(password) => password,
        None => return ack(false),
    };

    let result = match client
        .get_one(USERS_TABLE, Condition::eq("username", username))
        .await
    {
        Ok(result) => result,
        Err(e) => {
            error!("login lookup failed: {}", e);
            return ack(false);
        }
    };
    if !result.is_success() {
        error!(
            "login lookup failed: {}",
            result.message().unwrap_or("unknown error")
        );
        return ack(false);
    }

    let user = match result.payload() {
        Some(user) => user,
        None => return ack(false),
    };
    let digest = digest_password(password);
    let username_matches = user.get_property("username").as_str() == Some(username);
    let password_matches = user.get_property("pass").as_str() == Some(digest.as_str());
    if !(username_matches && password_matches) {
        return ack(false);
    }

    // sign a fresh credential over the stored fields
    let mut claims = Record::new();
    claims.insert("username".to_string(), Data::from(username));
    claims.insert("pass".to_string(), Data::from(digest));
    match issuer.sign(&claims) {
        Ok(token) => {
            let mut reply = ack(true);
            reply.insert("token".to_string(), Data::from(token));
            reply
        }
        Err(e) => {
            error!("failed to issue login token: {}", e);
            ack(false)
        }
    }
}

/// Handle one register call: insert a user record with the supplied
/// username and the digest of the supplied password. The acknowledgment is
/// simply whether the insert was accepted; a failure is also logged. Two
/// registrations with the same username are two independent inserts.
pub async fn register(client: &ClientChannel, params: &Record) -> Record {
    let username = match params.get("username").and_then(Data::as_str) {
        Some(username) => username,
        None => return ack(false),
    };
    let password = match params.get("password").and_then(Data::as_str) {
        Some(password) => password,
        None => return ack(false),
    };

    let mut user = Record::new();
    user.insert("username".to_string(), Data::from(username));
    user.insert("pass".to_string(), Data::from(digest_password(password)));

    match client.insert(USERS_TABLE, user).await {
        Ok(result) => {
            if !result.is_success() {
                error!(
                    "register insert failed: {}",
                    result.message().unwrap_or("unknown error")
                );
            }
            ack(result.is_success())
        }
        Err(e) => {
            error!("register insert failed: {}", e);
            ack(false)
        }
    }
}

/// Register the `login` and `register` handlers on a channel.
pub async fn attach(channel: &ClientChannel, issuer: TokenIssuer) -> Result<(), ClientError> {
    let login_issuer = issuer.clone();
    channel
        .register(
            "login",
            move |client: ClientChannel, params: Record, _auth: Record| -> HandlerFuture {
                let issuer = login_issuer.clone();
                Box::pin(async move { login(&client, &issuer, &params).await })
            },
        )
        .await?;

    channel
        .register(
            "register",
            move |client: ClientChannel, params: Record, _auth: Record| -> HandlerFuture {
                Box::pin(async move { register(&client, &params).await })
            },
        )
        .await?;

    Ok(())
}

/// Passwords are never stored or compared as plaintext, only as digests.
fn digest_password(password: &str) -> String {
    sha256::digest(password)
}

fn ack(ack: bool) -> Record {
    let mut reply = Record::new();
    reply.insert("ack".to_string(), Data::from(ack));
    reply
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ack_payload_shape() {
        let reply = ack(true);
        assert_eq!(reply.get("ack").and_then(Data::as_bool), Some(true));
        let reply = ack(false);
        assert_eq!(reply.get("ack").and_then(Data::as_bool), Some(false));
    }

    #[test]
    fn digests_are_not_plaintext() {
        let digest = digest_password("p");
        assert_ne!(digest, "p");
        assert_eq!(digest, digest_password("p"));
        assert_ne!(digest, digest_password("q"));
    }
}

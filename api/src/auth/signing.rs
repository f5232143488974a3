use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use pdash_db::models::SessionId;
use rand::RngCore;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SECRET_LENGTH: usize = 32;

/// Signs session ids into cookie values of the form `{session_id}.{mac}`.
#[derive(Clone)]
pub struct SessionSigner {
    secret: [u8; SECRET_LENGTH],
}

impl SessionSigner {
    pub fn new(secret: [u8; SECRET_LENGTH]) -> Self {
        Self { secret }
    }

    pub fn generate_secret() -> [u8; SECRET_LENGTH] {
        let mut secret = [0u8; SECRET_LENGTH];
        rand::rng().fill_bytes(&mut secret);
        secret
    }

    /// Parse a hex secret as kept in the settings store.
    pub fn from_hex(secret: &str) -> Option<Self> {
        let bytes = hex::decode(secret.trim()).ok()?;
        let secret: [u8; SECRET_LENGTH] = bytes.try_into().ok()?;
        Some(Self::new(secret))
    }

    pub fn secret_hex(&self) -> String {
        hex::encode(self.secret)
    }

    fn mac(&self, payload: &str) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(payload.as_bytes());
        mac
    }

    pub fn sign(&self, session_id: &SessionId) -> String {
        let payload = session_id.to_string();
        let signature = URL_SAFE_NO_PAD.encode(self.mac(&payload).finalize().into_bytes());
        format!("{payload}.{signature}")
    }

    /// Returns the session id if the signature matches.
    pub fn verify(&self, signed: &str) -> Option<SessionId> {
        let (payload, signature) = signed.split_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;

        // constant time
        self.mac(payload).verify_slice(&signature).ok()?;

        payload.parse().ok()
    }
}

use crate::casino::{read_array, read_string, string_encode_size, write_string, MAX_EMAIL_LENGTH};
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, FixedSize, Read, ReadExt, Write};
use commonware_cryptography::sha256::Digest;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Length of the salt mixed into a password digest.
pub const SALT_LENGTH: usize = 16;

/// Opaque identifier of a registered principal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(Uuid);

impl PrincipalId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for PrincipalId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Write for PrincipalId {
    fn write(&self, writer: &mut impl BufMut) {
        writer.put_slice(self.0.as_bytes());
    }
}

impl Read for PrincipalId {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self(Uuid::from_bytes(read_array(reader)?)))
    }
}

impl FixedSize for PrincipalId {
    const SIZE: usize = 16;
}

/// An authenticated user identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub email: String,
}

impl Write for Principal {
    fn write(&self, writer: &mut impl BufMut) {
        self.id.write(writer);
        write_string(&self.email, writer);
    }
}

impl Read for Principal {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            id: PrincipalId::read(reader)?,
            email: read_string(reader, MAX_EMAIL_LENGTH)?,
        })
    }
}

impl EncodeSize for Principal {
    fn encode_size(&self) -> usize {
        PrincipalId::SIZE + string_encode_size(&self.email)
    }
}

/// The persisted credit balance of one principal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerEntry {
    pub email: String,
    pub credits: u64,
    pub created_at_ms: u64,
}

impl LedgerEntry {
    pub fn new(email: String, credits: u64, created_at_ms: u64) -> Self {
        Self {
            email,
            credits,
            created_at_ms,
        }
    }
}

impl Write for LedgerEntry {
    fn write(&self, writer: &mut impl BufMut) {
        write_string(&self.email, writer);
        self.credits.write(writer);
        self.created_at_ms.write(writer);
    }
}

impl Read for LedgerEntry {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            email: read_string(reader, MAX_EMAIL_LENGTH)?,
            credits: u64::read(reader)?,
            created_at_ms: u64::read(reader)?,
        })
    }
}

impl EncodeSize for LedgerEntry {
    fn encode_size(&self) -> usize {
        string_encode_size(&self.email) + u64::SIZE + u64::SIZE
    }
}

/// Salted password digest bound to a principal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credential {
    pub principal: Principal,
    pub salt: [u8; SALT_LENGTH],
    pub digest: Digest,
}

impl Write for Credential {
    fn write(&self, writer: &mut impl BufMut) {
        self.principal.write(writer);
        writer.put_slice(&self.salt);
        self.digest.write(writer);
    }
}

impl Read for Credential {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            principal: Principal::read(reader)?,
            salt: read_array(reader)?,
            digest: Digest::read(reader)?,
        })
    }
}

impl EncodeSize for Credential {
    fn encode_size(&self) -> usize {
        self.principal.encode_size() + SALT_LENGTH + Digest::SIZE
    }
}

/// Address of a document in the store.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Key {
    /// Credit balance of a principal (tag 0)
    Ledger(PrincipalId),
    /// Credential indexed by normalized email (tag 1)
    Credential(String),
}

impl Write for Key {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Ledger(id) => {
                0u8.write(writer);
                id.write(writer);
            }
            Self::Credential(email) => {
                1u8.write(writer);
                write_string(email, writer);
            }
        }
    }
}

impl Read for Key {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let key = match u8::read(reader)? {
            0 => Self::Ledger(PrincipalId::read(reader)?),
            1 => Self::Credential(read_string(reader, MAX_EMAIL_LENGTH)?),
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(key)
    }
}

impl EncodeSize for Key {
    fn encode_size(&self) -> usize {
        1 + match self {
            Self::Ledger(_) => PrincipalId::SIZE,
            Self::Credential(email) => string_encode_size(email),
        }
    }
}

/// Document body stored under a [Key].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    Ledger(LedgerEntry),
    Credential(Credential),
}

impl Write for Value {
    fn write(&self, writer: &mut impl BufMut) {
        match self {
            Self::Ledger(entry) => {
                0u8.write(writer);
                entry.write(writer);
            }
            Self::Credential(credential) => {
                1u8.write(writer);
                credential.write(writer);
            }
        }
    }
}

impl Read for Value {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let value = match u8::read(reader)? {
            0 => Self::Ledger(LedgerEntry::read(reader)?),
            1 => Self::Credential(Credential::read(reader)?),
            i => return Err(Error::InvalidEnum(i)),
        };

        Ok(value)
    }
}

impl EncodeSize for Value {
    fn encode_size(&self) -> usize {
        1 + match self {
            Self::Ledger(entry) => entry.encode_size(),
            Self::Credential(credential) => credential.encode_size(),
        }
    }
}

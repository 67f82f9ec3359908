//! vault-env - Vault KV and Transit secrets for the command line.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── put           # Store a value, a field, or a whole file
//! │   ├── get           # Read a secret or a configured set
//! │   ├── sync          # Write configured secrets to a .env file
//! │   ├── run           # Run a command with secrets injected
//! │   ├── json          # Convert a .env file to JSON
//! │   ├── completions   # Shell completions
//! │   └── output        # Terminal output helpers
//! └── core/             # Core library components
//!     ├── backend/      # Vault gateway
//!     │   ├── mod       # Backend trait and SecretPath
//!     │   ├── vault     # HTTP client (KV v2 + Transit)
//!     │   ├── auth      # Token, AppRole, GitHub, Kubernetes login
//!     │   └── memory    # In-memory backend
//!     ├── record        # Record shape classification
//!     ├── merge         # Merge engine
//!     ├── loader        # Env-file and raw-file loaders
//!     ├── env           # .env parsing and writing
//!     ├── aggregate     # Config-driven aggregation
//!     ├── transit       # Encryption context
//!     ├── config        # vault-env.yaml
//!     ├── settings      # Connection settings
//!     └── render        # JSON and env-line rendering
//! ```
//!
//! # Record shapes
//!
//! A KV record is stored as a flat string map but is read as one of:
//!
//! - a single plaintext value (`{"value": ...}`)
//! - a single encrypted value (`{"ciphertext": "vault:v1:..."}`)
//! - named fields, each plaintext or encrypted
//!
//! Writing a named field onto a single-value record replaces it with a
//! one-field record; writing a single value replaces everything.

pub mod cli;
pub mod core;
pub mod error;

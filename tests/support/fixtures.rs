//! Test fixtures and constants.

/// Region every library test runs in.
pub const REGION: &str = "us-east-1";

/// A bare key id, as passed with `--keyid`.
pub const KEY_ID: &str = "1234abcd-12ab-34cd-56ef-1234567890ab";

/// Another bare key id for override tests.
pub const OTHER_KEY_ID: &str = "0987dcba-09ba-87dc-65fe-0987654321ba";

/// Manifest file name for the dev stage.
pub const DEV_MANIFEST: &str = "kms-secrets.dev.us-east-1.yml";

/// Shared manifest file name under per-stage sharding.
pub const SHARDED_MANIFEST: &str = "kms-secrets.us-east-1.yml";

/// Standard test secrets used across multiple tests.
pub const STANDARD_SECRETS: &[(&str, &str)] = &[
    ("DATABASE_URL", "postgres://localhost/mydb"),
    ("API_KEY", "sk-test-12345"),
    ("JWT_SECRET", "super-secret-jwt-token"),
    ("REDIS_URL", "redis://localhost:6379"),
    ("S3_BUCKET", "my-app-bucket"),
];

/// Descriptor with module configuration and provider defaults.
pub const DESCRIPTOR: &str = r#"
service: demo
provider:
  name: aws
  stage: staging
  region: eu-west-1
  environment:
    DB_PASSWORD: hunter2
custom:
  serverless-kms-secrets:
    autoEncryptEnvVarOnPackageOrDeploy: true
    envVariablesToEncrypt:
      - DB_PASSWORD
"#;

/// A manifest as an older release wrote it, with an empty secrets block.
pub const LEGACY_MANIFEST: &str = "keyArn: arn:aws:kms:us-east-1:123456789012:key/1234abcd-12ab-34cd-56ef-1234567890ab\nsecrets:\n";

/// Descriptor ready for the environment sweep, with one unresolved reference.
pub const SWEEP_DESCRIPTOR: &str = r#"
service: demo
provider:
  name: aws
  stage: staging
  region: eu-west-1
  environment:
    DB_PASSWORD: hunter2
    REF: ${env:REAL}
custom:
  serverless-kms-secrets:
    keyId: alias/demo
    autoEncryptEnvVarOnPackageOrDeploy: true
    envVariablesToEncrypt:
      - DB_PASSWORD
      - REF
"#;

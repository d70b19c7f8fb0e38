//! Curated lookup data injected into the resolver, classifier, and
//! validator at construction time.
//!
//! Nothing in here is a process-wide constant: tests substitute small
//! fixtures through the same [`CatalogTables`] value the CLI builds with
//! [`CatalogTables::builtin`].

use crate::model::AdapterSpec;
use std::collections::BTreeMap;

/// A curated pass-condition template for one adapter identifier.
#[derive(Debug, Clone)]
pub struct ConditionTemplate {
    /// Boolean expression over the `resource` object, verbatim.
    pub condition: String,
    /// Field documentation for the adapter, when known.
    pub adapter_spec: Option<AdapterSpec>,
}

/// Ordered keyword sets for the severity classifier, tested
/// critical → high → medium → low.
#[derive(Debug, Clone, Default)]
pub struct SeverityKeywords {
    pub critical: Vec<String>,
    pub high: Vec<String>,
    pub medium: Vec<String>,
    pub low: Vec<String>,
}

/// All lookup data the pipeline depends on.
#[derive(Debug, Clone, Default)]
pub struct CatalogTables {
    /// Exact-match pass-condition templates, keyed by adapter id.
    pub templates: BTreeMap<String, ConditionTemplate>,
    /// Keyword fallback table. Order matters only for breaking ties
    /// between equally long matches; resolution is longest-match-first.
    pub keywords: Vec<String>,
    pub severity_keywords: SeverityKeywords,
    /// Closed allowlist of resource-type tags rules may carry.
    pub resource_types: Vec<String>,
    /// Assertion ids hard-pinned to a subset of services. When present
    /// for an assertion, the pin overrides the matrix's broader list.
    pub service_pins: BTreeMap<String, Vec<String>>,
}

impl CatalogTables {
    /// The shipped catalog data for the AWS provider.
    #[must_use]
    pub fn builtin() -> Self {
        CatalogTables {
            templates: builtin_templates(),
            keywords: builtin_keywords(),
            severity_keywords: builtin_severity_keywords(),
            resource_types: builtin_resource_types(),
            service_pins: builtin_service_pins(),
        }
    }
}

fn spec(fields: &[(&str, &str)]) -> Option<AdapterSpec> {
    Some(AdapterSpec {
        returns: fields
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect(),
    })
}

fn template(condition: &str, adapter_spec: Option<AdapterSpec>) -> ConditionTemplate {
    ConditionTemplate {
        condition: condition.to_string(),
        adapter_spec,
    }
}

#[allow(clippy::too_many_lines)]
fn builtin_templates() -> BTreeMap<String, ConditionTemplate> {
    let mut t = BTreeMap::new();

    // IAM & authentication
    t.insert(
        "aws.iam.root_mfa_status".to_string(),
        template(
            "resource.root_mfa_enabled == true",
            spec(&[
                ("root_mfa_enabled", "boolean - whether root user has MFA enabled"),
                ("root_user_used", "boolean - whether root user has been used recently"),
            ]),
        ),
    );
    t.insert(
        "aws.iam.user_mfa_status".to_string(),
        template(
            "len(resource.mfa_devices) > 0",
            spec(&[("mfa_devices", "array of MFA device objects")]),
        ),
    );
    t.insert(
        "aws.iam.account_password_policy".to_string(),
        template(
            "resource.password_policy.min_length >= 14",
            spec(&[("password_policy.min_length", "number - minimum password length")]),
        ),
    );
    t.insert(
        "aws.identity_center.mfa_settings".to_string(),
        template(
            "resource.mfa_required == true",
            spec(&[
                ("mfa_required", "boolean - whether MFA is required"),
                ("instance_status", "string - status of the identity center instance"),
            ]),
        ),
    );

    // S3 & storage
    t.insert(
        "aws.s3.default_encryption".to_string(),
        template(
            "resource.bucket_encryption.enabled == true",
            spec(&[
                ("bucket_encryption.enabled", "boolean - whether default encryption is enabled"),
                ("bucket_encryption.algorithm", "string - encryption algorithm used"),
            ]),
        ),
    );
    t.insert(
        "aws.s3.bucket_encryption".to_string(),
        template(
            "resource.bucket_encryption.enabled == true",
            spec(&[("bucket_encryption.enabled", "boolean - whether default encryption is enabled")]),
        ),
    );
    t.insert(
        "aws.s3.public_access_blocked".to_string(),
        template(
            "resource.block_public_access.enabled == true && resource.policy_allows_public == false",
            spec(&[
                ("block_public_access.enabled", "boolean - whether public access is blocked"),
                ("policy_allows_public", "boolean - whether bucket policy allows public access"),
                ("acl_public", "boolean - whether bucket ACL is public"),
            ]),
        ),
    );
    t.insert(
        "aws.s3.bucket_kms".to_string(),
        template(
            "resource.default_encryption.enabled == true && resource.default_encryption.key_type == \"CMK\"",
            spec(&[
                ("default_encryption.enabled", "boolean - whether default encryption is enabled"),
                ("default_encryption.key_type", "string - type of encryption key (CMK, AES256)"),
            ]),
        ),
    );
    t.insert(
        "aws.s3.versioning".to_string(),
        template(
            "resource.versioning.enabled == true",
            spec(&[("versioning.enabled", "boolean - whether bucket versioning is enabled")]),
        ),
    );
    t.insert(
        "aws.ebs.volume_encryption".to_string(),
        template(
            "resource.encrypted == true",
            spec(&[("encrypted", "boolean - whether the volume is encrypted")]),
        ),
    );
    t.insert(
        "aws.efs.encrypted".to_string(),
        template(
            "resource.encrypted == true",
            spec(&[("encrypted", "boolean - whether the filesystem is encrypted")]),
        ),
    );

    // Databases
    t.insert(
        "aws.rds.storage_encrypted".to_string(),
        template(
            "resource.storage_encrypted == true",
            spec(&[
                ("storage_encrypted", "boolean - whether storage is encrypted"),
                ("encryption_key", "string - KMS key used for encryption"),
            ]),
        ),
    );
    t.insert(
        "aws.rds.multi_az".to_string(),
        template(
            "resource.multi_az == true",
            spec(&[("multi_az", "boolean - whether the instance is multi-AZ")]),
        ),
    );
    t.insert(
        "aws.dynamodb.kms_cmk".to_string(),
        template(
            "resource.kms_key_id != null && resource.kms_key_id != \"alias/aws/dynamodb\"",
            spec(&[("kms_key_id", "string - KMS key ID used for encryption")]),
        ),
    );
    t.insert(
        "aws.dynamodb.point_in_time_recovery".to_string(),
        template(
            "resource.point_in_time_recovery.enabled == true",
            spec(&[("point_in_time_recovery.enabled", "boolean - whether PITR is enabled")]),
        ),
    );

    // Network security
    t.insert(
        "aws.ec2.security_groups_deny_all_default".to_string(),
        template(
            "resource.has_ingress_open_to_world == false && resource.has_egress_any_any == false",
            spec(&[
                ("has_ingress_open_to_world", "boolean - whether any SG allows ingress from 0.0.0.0/0"),
                ("has_egress_any_any", "boolean - whether any SG allows egress to 0.0.0.0/0"),
            ]),
        ),
    );
    t.insert(
        "aws.ec2.ssh_rdp_restricted".to_string(),
        template(
            "resource.ssh_restricted == true && resource.rdp_restricted == true",
            spec(&[
                ("ssh_restricted", "boolean - whether SSH (port 22) is restricted"),
                ("rdp_restricted", "boolean - whether RDP (port 3389) is restricted"),
                ("allowed_cidrs", "array - list of allowed CIDR blocks"),
            ]),
        ),
    );
    t.insert(
        "aws.wafv2.web_acl".to_string(),
        template(
            "len(resource.managed_rule_groups) > 0 && len(resource.associated_resources) > 0",
            spec(&[
                ("managed_rule_groups", "array of managed rule groups"),
                ("associated_resources", "array of associated resources"),
            ]),
        ),
    );
    t.insert(
        "aws.cloudfront.waf_enabled".to_string(),
        template(
            "resource.waf_web_acl_id != null",
            spec(&[("waf_web_acl_id", "string with WAF Web ACL ID")]),
        ),
    );

    // Monitoring & logging
    t.insert(
        "aws.cloudtrail.log_collection_enabled".to_string(),
        template(
            "resource.logging_enabled == true && resource.multi_region == true",
            spec(&[
                ("logging_enabled", "boolean - whether CloudTrail logging is enabled"),
                ("multi_region", "boolean - whether the trail covers all regions"),
                ("log_file_validation", "boolean - whether log file validation is enabled"),
            ]),
        ),
    );
    t.insert(
        "aws.cloudwatch.log_retention".to_string(),
        template(
            "resource.retention_in_days >= 30",
            spec(&[("retention_in_days", "number - log group retention in days")]),
        ),
    );

    // Keys & secrets
    t.insert(
        "aws.kms.key_rotation".to_string(),
        template(
            "resource.rotation_enabled == true",
            spec(&[("rotation_enabled", "boolean - whether annual key rotation is enabled")]),
        ),
    );
    t.insert(
        "aws.secrets_manager.rotation".to_string(),
        template(
            "resource.rotation_enabled == true",
            spec(&[("rotation_enabled", "boolean - whether secret rotation is enabled")]),
        ),
    );

    // Backup & recovery
    t.insert(
        "aws.backup.backup_plans_configured".to_string(),
        template(
            "len(resource.backup_plans) > 0 && resource.vault_encryption_enabled == true",
            spec(&[
                ("backup_plans", "array - backup plans configured"),
                ("vault_encryption_enabled", "boolean - whether the backup vault is encrypted"),
            ]),
        ),
    );

    // Containers
    t.insert(
        "aws.ecr.image_scanning".to_string(),
        template(
            "resource.scan_on_push == true",
            spec(&[("scan_on_push", "boolean - whether images are scanned on push")]),
        ),
    );
    t.insert(
        "aws.eks.cluster_logging".to_string(),
        template(
            "resource.logging.enabled == true",
            spec(&[("logging.enabled", "boolean - whether control-plane logging is enabled")]),
        ),
    );

    t
}

fn builtin_keywords() -> Vec<String> {
    // Semantic fragments matched against adapter ids when no curated
    // template exists. Matching is longest-first, so the more specific
    // fragments here ("disaster_recovery") can never be shadowed by the
    // broader ones ("recovery").
    [
        "disaster_recovery",
        "high_availability",
        "authentication",
        "authorization",
        "vulnerability",
        "encryption",
        "monitoring",
        "versioning",
        "compliance",
        "governance",
        "retention",
        "lifecycle",
        "recovery",
        "scanning",
        "rotation",
        "firewall",
        "hardening",
        "patching",
        "tagging",
        "logging",
        "backup",
        "policy",
        "access",
        "audit",
        "alerting",
        "threat",
        "ssl",
        "certificate",
        "segmentation",
        "isolation",
        "replication",
        "snapshot",
        "multi_az",
        "signing",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

fn builtin_severity_keywords() -> SeverityKeywords {
    fn list(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| (*s).to_string()).collect()
    }
    SeverityKeywords {
        critical: list(&["root", "admin", "public", "unencrypted", "open", "disabled"]),
        high: list(&[
            "mfa",
            "encryption",
            "deny-all",
            "privilege",
            "authentication",
            "authorization",
        ]),
        medium: list(&["logging", "monitoring", "backup", "rotation", "compliance"]),
        low: list(&["tagging", "versioning", "documentation", "naming"]),
    }
}

fn builtin_resource_types() -> Vec<String> {
    [
        "identity.user",
        "identity.role",
        "identity.service_account",
        "identity.tenant",
        "rbac.role",
        "rbac.group",
        "rbac.policy",
        "secrets.store",
        "secrets.secret",
        "crypto.kms",
        "crypto.kms.key",
        "storage.bucket",
        "storage.object",
        "storage.fileshare",
        "storage.queue",
        "storage.table",
        "storage.snapshot",
        "db.instance",
        "db.cluster",
        "db.user",
        "compute.vm",
        "compute.image",
        "compute.disk",
        "network.vpc",
        "network.subnet",
        "network.security_group",
        "network.firewall",
        "network.load_balancer",
        "network.gateway",
        "network.endpoint",
        "dns.zone",
        "edge.waf",
        "edge.cdn",
        "k8s.cluster",
        "k8s.node_pool",
        "k8s.namespace",
        "k8s.workload",
        "k8s.admission",
        "k8s.network_policy",
        "serverless.function",
        "paas.app",
        "registry.repo",
        "registry.policy",
        "logging.sink",
        "logging.store",
        "monitoring.alert",
        "monitoring.metric",
        "platform.control_plane",
        "platform.api_endpoint",
        "backup.plan",
        "backup.vault",
        "dr.plan",
        "governance.org",
        "governance.project",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

fn builtin_service_pins() -> BTreeMap<String, Vec<String>> {
    fn pin(services: &[&str]) -> Vec<String> {
        services.iter().map(|s| (*s).to_string()).collect()
    }
    let mut pins = BTreeMap::new();
    pins.insert(
        "network_perimeter.firewall_rules.waf_enabled".to_string(),
        pin(&["wafv2"]),
    );
    pins.insert(
        "network_perimeter.firewall_rules.waf_enabled_at_edge".to_string(),
        pin(&["cloudfront"]),
    );
    pins.insert(
        "network_perimeter.firewall_rules.deny_all_default".to_string(),
        pin(&["ec2"]),
    );
    pins.insert(
        "network_perimeter.firewall_rules.ssh_rdp_restricted".to_string(),
        pin(&["ec2"]),
    );
    pins.insert(
        "network_perimeter.firewall_rules.egress_filtering_enabled".to_string(),
        pin(&["ec2"]),
    );
    pins.insert(
        "crypto_data_protection.encryption_at_rest.database_encryption_enabled".to_string(),
        pin(&["rds"]),
    );
    pins.insert(
        "crypto_data_protection.encryption_at_rest.volume_encryption_enabled".to_string(),
        pin(&["ec2"]),
    );
    pins.insert(
        "crypto_data_protection.encryption_at_rest.customer_managed_keys_used".to_string(),
        pin(&["s3", "kms"]),
    );
    pins.insert(
        "crypto_data_protection.key_management.customer_managed_keys_used".to_string(),
        pin(&["s3", "kms"]),
    );
    pins.insert(
        "identity_access.authentication.strong_authn_enabled".to_string(),
        pin(&["iam", "identity-center", "cognito"]),
    );
    pins
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_tables_are_consistent() {
        let tables = CatalogTables::builtin();
        assert!(!tables.templates.is_empty());
        assert!(!tables.keywords.is_empty());
        assert!(!tables.resource_types.is_empty());

        // Every pinned assertion names at least one service.
        for (assertion_id, services) in &tables.service_pins {
            assert!(!services.is_empty(), "empty pin for {assertion_id}");
        }
    }

    #[test]
    fn test_keyword_table_has_no_duplicates() {
        let tables = CatalogTables::builtin();
        let mut seen = std::collections::BTreeSet::new();
        for kw in &tables.keywords {
            assert!(seen.insert(kw.clone()), "duplicate keyword {kw}");
        }
    }
}

//! Static revision notes, one section per exam objective.

pub const CHEAT_SHEET_TITLE: &str = "Exam Cheat Sheet: Official Objectives for Terraform Associate (003)";

/// A term and what to remember about it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheatEntry {
    pub term: &'static str,
    pub detail: &'static str,
}

/// Notes for one objective, keyed by its topic id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheatSection {
    pub topic_id: &'static str,
    pub title: &'static str,
    /// Example configuration shown before the entries.
    pub code: Option<&'static str>,
    pub entries: &'static [CheatEntry],
}

const fn entry(term: &'static str, detail: &'static str) -> CheatEntry {
    CheatEntry { term, detail }
}

/// Sections in objective order; the ids follow [`crate::model::EXAM_TOPICS`].
pub const CHEAT_SHEET: [CheatSection; 9] = [
    CheatSection {
        topic_id: "iac-concepts",
        title: "1. IaC Concepts",
        code: None,
        entries: &[
            entry(
                "Idempotence",
                "Applying the same configuration multiple times results in the same final state (convergent).",
            ),
            entry(
                "Benefits of IaC",
                "Consistency (prevents config drift). Reusability (modules). Auditability (version control).",
            ),
            entry(
                "Day 0 / 1 / 2",
                "Day 0: design and architecture. Day 1: initial provisioning. Day 2: maintenance and updates.",
            ),
        ],
    },
    CheatSection {
        topic_id: "terraform-purpose",
        title: "2. Purpose of Terraform",
        code: None,
        entries: &[
            entry(
                "Platform agnostic",
                "Manages resources across AWS, Azure and GCP in a single workflow, unlike CloudFormation (AWS only) or ARM (Azure only).",
            ),
            entry(
                "Immutable infrastructure",
                "Resources tend to be replaced rather than modified in place. New server means a new machine image, not a patch.",
            ),
        ],
    },
    CheatSection {
        topic_id: "terraform-basics",
        title: "3. Terraform Basics",
        code: Some(
            r#"terraform {
  required_providers {
    aws = {
      source  = "hashicorp/aws"
      version = "~> 4.0"
    }
  }
}

provider "aws" {
  region = "us-west-2"
}

resource "aws_instance" "web" {
  ami = "ami-12345"
}

data "aws_ami" "ubuntu" {
  most_recent = true
}"#,
        ),
        entries: &[
            entry(
                "Provider",
                "A plugin that lets Terraform talk to an API (AWS, Azure, etc).",
            ),
            entry("Resource", "resource \"type\" \"name\". Creates infrastructure."),
            entry("Data source", "data \"type\" \"name\". Reads existing infrastructure."),
            entry(
                "Terraform block",
                "Configures Terraform itself (required version, backend).",
            ),
        ],
    },
    CheatSection {
        topic_id: "terraform-cli",
        title: "4. Terraform CLI Reference",
        code: None,
        entries: &[
            entry(
                "terraform init",
                "Required first command. Downloads plugins and modules. Flags: -upgrade, -reconfigure, -migrate-state, -backend=false.",
            ),
            entry(
                "terraform plan",
                "Compares config to state and checks for drift. Flags: -out=path, -refresh-only, -target=addr, -var 'k=v', -var-file=file.",
            ),
            entry(
                "terraform apply",
                "Provisions resources and updates the state file. Flags: -auto-approve, -input=false, -replace=addr.",
            ),
            entry(
                "terraform destroy",
                "Removes all managed resources. Flags: -auto-approve, -target=addr.",
            ),
            entry("terraform state list", "List all resources in the state file."),
            entry("terraform state show <addr>", "Show details of a single resource."),
            entry(
                "terraform state mv <src> <dst>",
                "Rename or move a resource in state (the real resource is kept).",
            ),
            entry(
                "terraform state rm <addr>",
                "Stop tracking a resource (does not destroy it).",
            ),
            entry("terraform state pull", "Print remote state to stdout."),
            entry(
                "terraform state push",
                "Overwrite remote state with a local file (dangerous).",
            ),
            entry(
                "terraform import <addr> <id>",
                "Bring an existing real-world resource under Terraform management.",
            ),
            entry(
                "terraform fmt",
                "Rewrite config to canonical format. Flags: -recursive, -check, -diff.",
            ),
            entry(
                "terraform validate",
                "Check syntax and internal references without API calls. Flags: -json.",
            ),
            entry("terraform console", "Interactive REPL for testing expressions."),
            entry("terraform output", "Print output values. Flags: -json."),
            entry("terraform force-unlock <id>", "Manually release a stuck state lock."),
            entry("terraform login", "Authenticate with Terraform Cloud or Enterprise."),
            entry(
                "terraform workspace list | new | select | show | delete",
                "Manage multiple state files for the same config (e.g. dev, prod). Only empty workspaces can be deleted.",
            ),
        ],
    },
    CheatSection {
        topic_id: "terraform-modules",
        title: "5. Modules",
        code: Some(
            r#"module "servers" {
  source = "./app-cluster" # local path, registry or Git URL

  # inputs are variables declared in the child module
  instance_count = 5
}

# outputs of a child module
output "ip" {
  value = module.servers.public_ip
}"#,
        ),
        entries: &[
            entry(
                "Root module",
                "The working directory where Terraform commands run.",
            ),
            entry("Child module", "A module called by another module."),
            entry(
                "Terraform Registry",
                "Public repository for providers and modules. Syntax: namespace/name/provider.",
            ),
        ],
    },
    CheatSection {
        topic_id: "terraform-workflow",
        title: "6. Workflow & Lifecycle",
        code: None,
        entries: &[
            entry("Standard workflow", "Write -> Plan -> Apply (init first)."),
            entry(
                "Drift detection",
                "plan -refresh-only compares state to real infrastructure without changing resources.",
            ),
            entry(
                "Resource replacement",
                "-replace=\"resource.addr\" forces recreation. Replaces the deprecated taint command.",
            ),
        ],
    },
    CheatSection {
        topic_id: "terraform-state",
        title: "7. State Management",
        code: None,
        entries: &[
            entry(
                "Why state?",
                "Maps configuration to real-world resources, tracks dependency metadata, caches attribute values and syncs collaborators.",
            ),
            entry("Remote state", "Stored in S3, Azure Blob or Terraform Cloud."),
            entry(
                "Locking",
                "Prevents concurrent writes (e.g. DynamoDB for S3 backends).",
            ),
            entry(
                "Security",
                "State holds sensitive data in plain text. Encrypt the backend.",
            ),
            entry(
                "Important",
                "Never commit terraform.tfstate to Git. Use .gitignore.",
            ),
        ],
    },
    CheatSection {
        topic_id: "terraform-config",
        title: "8. Configuration & HCL",
        code: Some(
            r#"variable "region" {
  type      = string
  default   = "us-west-1"
  validation { ... }
  sensitive = true
}

resource "aws_instance" "app" {
  count = 2 # list: aws_instance.app[0], [1]
  # or
  for_each = toset(["a", "b"]) # map: aws_instance.app["a"]
}

locals {
  common_tags = { Project = "Demo" }
}"#,
        ),
        entries: &[
            entry(
                "Variables",
                "Input parameters. Set through TF_VAR_name, terraform.tfvars or the CLI.",
            ),
            entry(
                "Variable types",
                "string, number, bool, list, map, object (complex struct), tuple (fixed list types), set (unique list).",
            ),
            entry("Locals", "Internal named values that keep code DRY."),
            entry("Outputs", "Return values to the CLI or parent modules."),
        ],
    },
    CheatSection {
        topic_id: "terraform-cloud",
        title: "9. Terraform Cloud (HCP Terraform)",
        code: None,
        entries: &[
            entry(
                "Remote state",
                "Stored in the cloud, encrypted at rest and versioned. No manual S3 setup.",
            ),
            entry(
                "Remote execution",
                "Runs happen on disposable cloud VMs, keeping secrets off local disks.",
            ),
            entry(
                "Private registry",
                "Share modules and providers privately within an organization.",
            ),
            entry(
                "Cost estimation",
                "Shows estimated cost changes for AWS, Azure and GCP resources during plan.",
            ),
            entry(
                "Workflows",
                "UI/VCS-driven (push triggers plan/apply), CLI-driven (local command, cloud runner) and API-driven (CI/CD through the API).",
            ),
            entry(
                "Sentinel",
                "Policy as code run between plan and apply. Hard mandatory stops the apply, soft mandatory can be overridden by an admin, advisory only logs.",
            ),
            entry(
                "Workspaces",
                "In the CLI a workspace is a separate state file. In Terraform Cloud it is a full environment: state, variables, connectors and run history.",
            ),
        ],
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EXAM_TOPICS;

    #[test]
    fn one_section_per_objective_in_order() {
        let ids: Vec<_> = CHEAT_SHEET.iter().map(|s| s.topic_id).collect();
        let topics: Vec<_> = EXAM_TOPICS.iter().map(|t| t.id).collect();
        assert_eq!(ids, topics);
    }

    #[test]
    fn sections_are_filled_in() {
        for section in &CHEAT_SHEET {
            assert!(!section.entries.is_empty(), "{}", section.title);
            assert!(section.entries.iter().all(|e| !e.term.is_empty() && !e.detail.is_empty()));
        }
    }
}

use pretty_assertions::assert_eq;

use archdiag::topology_parser::parse_topology;
use archdiag::{dot, festival, outline};

const FESTIVAL_TOPO: &str = include_str!("../demos/festival_pos.topo");

#[test]
fn snapshot_topo_matches_builder() {
    let parsed = parse_topology(FESTIVAL_TOPO).unwrap();
    let built = festival::topology().unwrap();
    assert_eq!(dot::to_dot(&parsed), dot::to_dot(&built));
}

#[test]
fn snapshot_festival_dot_shape() {
    let dot = dot::to_dot(&festival::topology().unwrap());

    assert!(dot.starts_with("digraph \"Festival POS System Architecture\" {\n"));
    let node_lines = dot
        .lines()
        .filter(|l| l.trim_start().starts_with('n') && l.contains(" [label=\"") && !l.contains("->"))
        .count();
    assert_eq!(node_lines, 17);
    assert_eq!(dot.matches("subgraph cluster_").count(), 6);
    assert_eq!(dot.lines().filter(|l| l.contains(" -> ")).count(), 30);
}

#[test]
fn snapshot_festival_decorated_edges() {
    let dot = dot::to_dot(&festival::topology().unwrap());
    for expected in [
        "  n1 -> n1 [dir=\"none\", style=\"dashed\", label=\"Stores Transactions\\nOffline\"];\n",
        "  n1 -> n2 [color=\"blue\", label=\"HTTPS\"];\n",
        "  n9 -> n11 [style=\"dashed\", color=\"darkgreen\"];\n",
        "  n10 -> n11 [style=\"dashed\", color=\"darkgreen\"];\n",
        "  n13 -> n14 [color=\"red\", label=\"Alerts\"];\n",
        "  n1 -> n12 [style=\"dotted\"];\n",
        "  n6 -> n6 [dir=\"both\", style=\"dashed\", label=\"Auto Scaling\"];\n",
    ] {
        assert!(dot.contains(expected), "missing {expected:?} in:\n{dot}");
    }
}

#[test]
fn snapshot_festival_outline_tree() {
    let text = outline::render(&festival::topology().unwrap());
    let expected = [
        "Festival POS System Architecture (LR)".to_string(),
        format!("├── {:<30}  generic-actor", "Festival Attendee"),
        format!("├── {:<30}  generic-client", "POS Device / (Offline Capable)"),
        format!("├── {:<30}  ci-cd", "CI/CD Pipeline"),
        "└── [AWS Cloud]".to_string(),
        format!("    ├── {:<20}  dns", "DNS"),
        format!("    ├── {:<20}  identity", "IAM Roles & Policies"),
        format!("    ├── {:<20}  user-directory", "User Pool"),
        "    └── [VPC]".to_string(),
        format!("        ├── {:<28}  object-storage", "S3 Bucket / (Backups & Logs)"),
        format!("        ├── {:<28}  message-queue", "SQS Queue"),
        format!("        ├── {:<28}  monitoring", "CloudWatch"),
        "        ├── [Public Subnet]".to_string(),
        format!("        │   ├── {:<25}  network-gateway", "API Gateway"),
        format!("        │   └── {:<25}  load-balancer", "Application Load Balancer"),
        "        └── [Private Subnet]".to_string(),
        "            ├── [Microservices]".to_string(),
        format!("            │   ├── {:<27}  serverless", "Auth Service"),
        format!("            │   ├── {:<27}  serverless", "Transaction Service"),
        format!("            │   ├── {:<27}  serverless", "User Management Service"),
        format!("            │   └── {:<27}  serverless", "Transaction History Service"),
        "            └── [Databases]".to_string(),
        format!("                ├── {:<26}  database", "DynamoDB / (Global Tables)"),
        format!("                └── {:<26}  database", "Aurora RDS"),
        String::new(),
        "Edges (30)".to_string(),
    ]
    .join("\n");
    assert!(
        text.starts_with(&format!("{expected}\n")),
        "got:\n{text}"
    );
}

#[test]
fn snapshot_festival_outline_edges() {
    let text = outline::render(&festival::topology().unwrap());
    let edges: Vec<&str> = text
        .lines()
        .skip_while(|l| !l.starts_with("Edges"))
        .skip(1)
        .collect();
    assert_eq!(edges.len(), 30);
    assert_eq!(
        edges[..3],
        [
            "  Festival Attendee ──> POS Device / (Offline Capable)",
            "  POS Device / (Offline Capable) ╌╌╌ POS Device / (Offline Capable)  [\"Stores Transactions / Offline\"]",
            "  POS Device / (Offline Capable) ──> DNS  [\"HTTPS\", blue]",
        ]
    );
    assert_eq!(
        edges[29],
        "  Transaction Service <╌╌> Transaction Service  [\"Auto Scaling\"]"
    );
}

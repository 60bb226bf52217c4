//! The festival point-of-sale deployment: attendees and offline-capable POS devices
//! talking to a serverless backend inside a cloud VPC.

use crate::builder::TopologyBuilder;
use crate::error::UsageError;
use crate::topology::*;

pub const TITLE: &str = "Festival POS System Architecture";

struct Microservices {
    auth: NodeId,
    transactions: NodeId,
    users: NodeId,
    history: NodeId,
}

impl Microservices {
    fn all(&self) -> [NodeId; 4] {
        [self.auth, self.transactions, self.users, self.history]
    }
}

pub fn topology() -> Result<Topology, UsageError> {
    let mut b = TopologyBuilder::new(TITLE);

    let attendee = b.declare_node(Category::GenericActor, "Festival Attendee");
    let pos = b.declare_node(Category::GenericClient, "POS Device\n(Offline Capable)");

    b.enter_cluster("AWS Cloud");
    let dns = b.declare_node(Category::Dns, "DNS");

    b.enter_cluster("VPC");
    let (api_gateway, alb) = b.cluster("Public Subnet", |b| {
        Ok((
            b.declare_node(Category::NetworkGateway, "API Gateway"),
            b.declare_node(Category::LoadBalancer, "Application Load Balancer"),
        ))
    })?;
    let (services, dynamodb, rds) = b.cluster("Private Subnet", |b| {
        let services = b.cluster("Microservices", |b| {
            Ok(Microservices {
                auth: b.declare_node(Category::Serverless, "Auth Service"),
                transactions: b.declare_node(Category::Serverless, "Transaction Service"),
                users: b.declare_node(Category::Serverless, "User Management Service"),
                history: b.declare_node(Category::Serverless, "Transaction History Service"),
            })
        })?;
        let (dynamodb, rds) = b.cluster("Databases", |b| {
            Ok((
                b.declare_node(Category::Database, "DynamoDB\n(Global Tables)"),
                b.declare_node(Category::Database, "Aurora RDS"),
            ))
        })?;
        Ok((services, dynamodb, rds))
    })?;
    let s3 = b.declare_node(Category::ObjectStorage, "S3 Bucket\n(Backups & Logs)");
    let sqs = b.declare_node(Category::MessageQueue, "SQS Queue");
    let cloudwatch = b.declare_node(Category::Monitoring, "CloudWatch");
    b.exit_cluster()?;

    let iam = b.declare_node(Category::Identity, "IAM Roles & Policies");
    let cognito = b.declare_node(Category::UserDirectory, "User Pool");
    b.exit_cluster()?;

    let backup = || {
        EdgeAttrs::new()
            .color("darkgreen")
            .style(EdgeStyle::Dashed)
    };

    b.connect(attendee, pos, EdgeAttrs::new())?;
    b.link(
        pos,
        pos,
        EdgeDirection::None,
        EdgeAttrs::new()
            .style(EdgeStyle::Dashed)
            .label("Stores Transactions\nOffline"),
    )?;
    b.connect(pos, dns, EdgeAttrs::new().label("HTTPS").color("blue"))?;
    b.connect(dns, api_gateway, EdgeAttrs::new())?;
    b.connect(api_gateway, alb, EdgeAttrs::new())?;
    b.fan_out(alb, &services.all(), EdgeAttrs::new())?;
    b.fan_in(&services.all(), dynamodb, EdgeAttrs::new())?;
    b.connect(services.transactions, rds, EdgeAttrs::new())?;
    b.fan_in(&services.all(), cloudwatch, EdgeAttrs::new())?;
    b.connect(dynamodb, s3, backup())?;
    b.connect(rds, s3, backup())?;
    b.connect(
        cloudwatch,
        iam,
        EdgeAttrs::new().label("Alerts").color("red"),
    )?;
    b.connect(api_gateway, cognito, EdgeAttrs::new())?;
    b.connect(cognito, iam, EdgeAttrs::new())?;

    let pipeline = b.declare_node(Category::CiCd, "CI/CD Pipeline");
    b.fan_out(pipeline, &services.all(), EdgeAttrs::new())?;

    b.connect(pos, sqs, EdgeAttrs::new().style(EdgeStyle::Dotted))?;
    b.connect(sqs, services.transactions, EdgeAttrs::new())?;
    b.link(
        services.transactions,
        services.transactions,
        EdgeDirection::Both,
        EdgeAttrs::new()
            .label("Auto Scaling")
            .style(EdgeStyle::Dashed),
    )?;

    b.build()
}

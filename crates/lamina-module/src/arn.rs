//! Resource name (ARN) parsing built on `nom`.
//!
//! Only the fixed `arn:partition:service:region:account:resource` shape is
//! recognized; the resource part is kept verbatim and may itself contain `:`.

use nom::{
    IResult, Parser,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::char,
    combinator::{all_consuming, rest, verify},
};

/// A parsed resource name borrowing from its source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Arn<'a> {
    /// Partition (`aws`, `aws-cn`, ...).
    pub partition: &'a str,
    /// Service namespace (`sqs`, `sns`, `lambda`, ...).
    pub service: &'a str,
    /// Region, empty for global services.
    pub region: &'a str,
    /// Account, empty for some service-owned resources.
    pub account: &'a str,
    /// Service-specific resource part.
    pub resource: &'a str,
}

impl Arn<'_> {
    /// Classifies the service namespace.
    #[must_use]
    pub fn family(&self) -> ServiceFamily {
        ServiceFamily::from_service(self.service)
    }
}

/// Service families the module wires policies for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceFamily {
    /// Simple Queue Service.
    Sqs,
    /// Simple Notification Service.
    Sns,
    /// Kinesis data streams.
    Kinesis,
    /// DynamoDB tables and streams.
    DynamoDb,
    /// Managed Kafka.
    Kafka,
    /// Managed message broker.
    Mq,
    /// Functions.
    Lambda,
    /// Event buses.
    Events,
    /// Anything else.
    Other,
}

impl ServiceFamily {
    fn from_service(service: &str) -> Self {
        match service {
            "sqs" => Self::Sqs,
            "sns" => Self::Sns,
            "kinesis" => Self::Kinesis,
            "dynamodb" => Self::DynamoDb,
            "kafka" => Self::Kafka,
            "mq" => Self::Mq,
            "lambda" => Self::Lambda,
            "events" => Self::Events,
            _ => Self::Other,
        }
    }

    /// Returns `true` for families that can feed an event-source subscription.
    #[must_use]
    pub const fn is_event_source(self) -> bool {
        matches!(
            self,
            Self::Sqs | Self::Kinesis | Self::DynamoDb | Self::Kafka | Self::Mq
        )
    }

    /// Action needed to deliver a record to a destination of this family.
    #[must_use]
    pub const fn delivery_action(self) -> Option<&'static str> {
        match self {
            Self::Sqs => Some("sqs:SendMessage"),
            Self::Sns => Some("sns:Publish"),
            Self::Lambda => Some("lambda:InvokeFunction"),
            Self::Events => Some("events:PutEvents"),
            _ => None,
        }
    }
}

const fn is_segment_char(c: char) -> bool {
    c != ':'
}

fn segment(input: &str) -> IResult<&str, &str> {
    take_while(is_segment_char).parse(input)
}

fn required_segment(input: &str) -> IResult<&str, &str> {
    take_while1(is_segment_char).parse(input)
}

fn arn(input: &str) -> IResult<&str, Arn<'_>> {
    let (input, _) = tag("arn:").parse(input)?;
    let (input, (partition, _, service, _, region, _, account, _)) = (
        required_segment,
        char(':'),
        required_segment,
        char(':'),
        segment,
        char(':'),
        segment,
        char(':'),
    )
        .parse(input)?;
    let (input, resource) = verify(rest, |r: &str| !r.is_empty()).parse(input)?;
    Ok((
        input,
        Arn {
            partition,
            service,
            region,
            account,
            resource,
        },
    ))
}

/// Parses `input` as a resource name.
///
/// Returns `None` when the text is not a well-formed ARN.
#[must_use]
pub fn parse_arn(input: &str) -> Option<Arn<'_>> {
    all_consuming(arn)
        .parse(input)
        .ok()
        .map(|(_, parsed)| parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_queue_arn() {
        let arn = parse_arn("arn:aws:sqs:eu-west-1:123456789012:orders").expect("parse");
        assert_eq!(arn.partition, "aws");
        assert_eq!(arn.service, "sqs");
        assert_eq!(arn.region, "eu-west-1");
        assert_eq!(arn.account, "123456789012");
        assert_eq!(arn.resource, "orders");
        assert_eq!(arn.family(), ServiceFamily::Sqs);
    }

    #[test]
    fn resource_may_contain_colons_and_slashes() {
        let arn = parse_arn(
            "arn:aws:dynamodb:us-east-1:123456789012:table/Books/stream/2024-01-01T00:00:00.000",
        )
        .expect("parse");
        assert_eq!(arn.service, "dynamodb");
        assert_eq!(arn.resource, "table/Books/stream/2024-01-01T00:00:00.000");
    }

    #[test]
    fn global_service_has_empty_region() {
        let arn = parse_arn("arn:aws:iam::123456789012:role/exec").expect("parse");
        assert_eq!(arn.region, "");
        assert_eq!(arn.resource, "role/exec");
        assert_eq!(arn.family(), ServiceFamily::Other);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_arn("not-an-arn").is_none());
        assert!(parse_arn("arn:aws:sqs:us-east-1:123").is_none());
        assert!(parse_arn("arn::sqs:us-east-1:123:queue").is_none());
        assert!(parse_arn("arn:aws:sqs:us-east-1:123:").is_none());
    }

    #[test]
    fn delivery_actions_by_family() {
        assert_eq!(ServiceFamily::Sns.delivery_action(), Some("sns:Publish"));
        assert_eq!(ServiceFamily::Sqs.delivery_action(), Some("sqs:SendMessage"));
        assert_eq!(ServiceFamily::Kinesis.delivery_action(), None);
        assert!(ServiceFamily::Kinesis.is_event_source());
        assert!(!ServiceFamily::Sns.is_event_source());
    }
}

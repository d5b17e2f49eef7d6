//! Absolute shape IDs of built-in traits

pub const TRAIT: &str = "smithy.api#trait";
pub const DOCUMENTATION: &str = "smithy.api#documentation";
pub const DEPRECATED: &str = "smithy.api#deprecated";
pub const PRIVATE: &str = "smithy.api#private";
pub const MIXIN: &str = "smithy.api#mixin";
pub const REQUIRED: &str = "smithy.api#required";
pub const DEFAULT: &str = "smithy.api#default";
pub const ADDED_DEFAULT: &str = "smithy.api#addedDefault";
pub const CLIENT_OPTIONAL: &str = "smithy.api#clientOptional";
pub const INPUT: &str = "smithy.api#input";
pub const OUTPUT: &str = "smithy.api#output";
pub const ERROR: &str = "smithy.api#error";
pub const SPARSE: &str = "smithy.api#sparse";
pub const LENGTH: &str = "smithy.api#length";
pub const RANGE: &str = "smithy.api#range";
pub const PATTERN: &str = "smithy.api#pattern";
pub const ENUM_VALUE: &str = "smithy.api#enumValue";
pub const SENSITIVE: &str = "smithy.api#sensitive";
pub const IDEMPOTENT: &str = "smithy.api#idempotent";
pub const READONLY: &str = "smithy.api#readonly";
pub const COLLECTION: &str = "smithy.api#collection";
pub const RESOURCE_IDENTIFIER: &str = "smithy.api#resourceIdentifier";
pub const PROPERTY: &str = "smithy.api#property";
pub const NOT_PROPERTY: &str = "smithy.api#notProperty";
pub const NESTED_PROPERTIES: &str = "smithy.api#nestedProperties";
pub const HTTP: &str = "smithy.api#http";
pub const HTTP_LABEL: &str = "smithy.api#httpLabel";
pub const HTTP_QUERY: &str = "smithy.api#httpQuery";
pub const HTTP_QUERY_PARAMS: &str = "smithy.api#httpQueryParams";
pub const HTTP_HEADER: &str = "smithy.api#httpHeader";
pub const HTTP_PREFIX_HEADERS: &str = "smithy.api#httpPrefixHeaders";
pub const HTTP_PAYLOAD: &str = "smithy.api#httpPayload";
pub const HTTP_RESPONSE_CODE: &str = "smithy.api#httpResponseCode";
pub const HTTP_ERROR: &str = "smithy.api#httpError";
pub const STREAMING: &str = "smithy.api#streaming";
pub const TAGS: &str = "smithy.api#tags";
pub const TITLE: &str = "smithy.api#title";
pub const UNIQUE_ITEMS: &str = "smithy.api#uniqueItems";
pub const UNIT_TYPE: &str = "smithy.api#unitType";
pub const SUPPRESS: &str = "smithy.api#suppress";

pub const AWS_ARN: &str = "aws.api#arn";
pub const AWS_SERVICE: &str = "aws.api#service";
pub const AWS_TAGGABLE: &str = "aws.api#taggable";
pub const AWS_TAG_ENABLED: &str = "aws.api#tagEnabled";
pub const HTTP_CHECKSUM: &str = "aws.protocols#httpChecksum";

//! DynamoDB implementation of [`TableService`] on the AWS SDK.

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::primitives::DateTime as SdkDateTime;
use aws_sdk_dynamodb::types::{
    self as sdk, ExportFormat, InputFormat, S3BucketSource, S3SseAlgorithm,
    TableCreationParameters, TableDescription,
};
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::{
    ExportJob, ExportRequest, ExportStatus, ImportJob, ImportRequest, ImportStatus, TableDetails,
    TableService,
};
use crate::error::ProviderError;
use crate::layout::table_name_from_identifier;
use crate::schema::{
    AttributeDefinition, AttributeType, BillingMode, KeyRole, KeySchemaElement, Projection,
    ProjectionType, ProvisionedThroughput, SecondaryIndex, TableSchema,
};
use crate::{Error, Result};

/// Load shared AWS configuration for a region.
///
/// `endpoint_url` points the clients at a local emulator instead of AWS.
pub async fn load_sdk_config(region: &str, endpoint_url: Option<&str>) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(aws_config::Region::new(region.to_string()));

    if let Some(endpoint) = endpoint_url {
        loader = loader.endpoint_url(endpoint);
    }

    loader.load().await
}

/// DynamoDB client bound to one region
#[derive(Clone)]
pub struct DynamoDbService {
    client: Client,
    region: String,
}

impl DynamoDbService {
    pub fn new(client: Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }

    /// Build a client for `region` from the default credential chain.
    pub async fn connect(region: &str, endpoint_url: Option<&str>) -> Self {
        let sdk_config = load_sdk_config(region, endpoint_url).await;
        info!("Created DynamoDB client for region: {}", region);
        Self::new(Client::new(&sdk_config), region)
    }
}

fn api_err<E>(operation: &str, err: E) -> Error
where
    E: std::error::Error + 'static,
{
    Error::Provider(ProviderError::api(
        operation,
        DisplayErrorContext(&err).to_string(),
    ))
}

fn build_err(err: impl std::fmt::Display) -> Error {
    Error::Provider(ProviderError::InvalidRequest(err.to_string()))
}

fn to_utc(dt: &SdkDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(dt.secs(), dt.subsec_nanos())
}

fn key_role(key_type: &sdk::KeyType) -> Result<KeyRole> {
    match key_type {
        sdk::KeyType::Hash => Ok(KeyRole::Partition),
        sdk::KeyType::Range => Ok(KeyRole::Sort),
        other => Err(build_err(format!("unsupported key type {}", other.as_str()))),
    }
}

fn key_schema_from_sdk(keys: &[sdk::KeySchemaElement]) -> Result<Vec<KeySchemaElement>> {
    keys.iter()
        .map(|k| {
            Ok(KeySchemaElement {
                attribute_name: k.attribute_name().to_string(),
                key_type: key_role(k.key_type())?,
            })
        })
        .collect()
}

fn projection_from_sdk(projection: Option<&sdk::Projection>) -> Projection {
    let projection_type = match projection.and_then(|p| p.projection_type()) {
        Some(sdk::ProjectionType::KeysOnly) => ProjectionType::KeysOnly,
        Some(sdk::ProjectionType::Include) => ProjectionType::Include,
        _ => ProjectionType::All,
    };
    Projection {
        projection_type,
        non_key_attributes: projection
            .map(|p| p.non_key_attributes().to_vec())
            .unwrap_or_default(),
    }
}

fn throughput_from_sdk(
    desc: Option<&sdk::ProvisionedThroughputDescription>,
) -> Option<ProvisionedThroughput> {
    let desc = desc?;
    match (desc.read_capacity_units(), desc.write_capacity_units()) {
        (Some(read), Some(write)) if read > 0 && write > 0 => Some(ProvisionedThroughput {
            read_capacity_units: read,
            write_capacity_units: write,
        }),
        _ => None,
    }
}

/// Reduce a full table description to the fields needed for re-creation.
fn schema_from_description(table: &TableDescription) -> Result<TableSchema> {
    let table_name = table
        .table_name()
        .ok_or_else(|| ProviderError::missing("DescribeTable", "TableName"))?
        .to_string();

    let attribute_definitions = table
        .attribute_definitions()
        .iter()
        .map(|a| {
            let attribute_type = match a.attribute_type() {
                sdk::ScalarAttributeType::S => AttributeType::String,
                sdk::ScalarAttributeType::N => AttributeType::Number,
                sdk::ScalarAttributeType::B => AttributeType::Binary,
                other => {
                    return Err(build_err(format!(
                        "unsupported attribute type {}",
                        other.as_str()
                    )))
                }
            };
            Ok(AttributeDefinition {
                attribute_name: a.attribute_name().to_string(),
                attribute_type,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let table_throughput = throughput_from_sdk(table.provisioned_throughput());

    // Tables created before on-demand billing existed report no billing summary.
    let billing_mode = match table.billing_mode_summary().and_then(|s| s.billing_mode()) {
        Some(sdk::BillingMode::Provisioned) => BillingMode::Provisioned,
        Some(_) => BillingMode::OnDemand,
        None if table_throughput.is_some() => BillingMode::Provisioned,
        None => BillingMode::OnDemand,
    };
    let provisioned = billing_mode == BillingMode::Provisioned;

    let gsis = table
        .global_secondary_indexes()
        .iter()
        .map(|gsi| {
            Ok(SecondaryIndex {
                index_name: gsi.index_name().unwrap_or_default().to_string(),
                key_schema: key_schema_from_sdk(gsi.key_schema())?,
                projection: projection_from_sdk(gsi.projection()),
                provisioned_throughput: if provisioned {
                    throughput_from_sdk(gsi.provisioned_throughput())
                } else {
                    None
                },
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let lsis = table
        .local_secondary_indexes()
        .iter()
        .map(|lsi| {
            Ok(SecondaryIndex {
                index_name: lsi.index_name().unwrap_or_default().to_string(),
                key_schema: key_schema_from_sdk(lsi.key_schema())?,
                projection: projection_from_sdk(lsi.projection()),
                provisioned_throughput: None,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(TableSchema {
        table_name,
        attribute_definitions,
        key_schema: key_schema_from_sdk(table.key_schema())?,
        billing_mode,
        provisioned_throughput: if provisioned { table_throughput } else { None },
        global_secondary_indexes: (!gsis.is_empty()).then_some(gsis),
        local_secondary_indexes: (!lsis.is_empty()).then_some(lsis),
    })
}

fn key_schema_to_sdk(keys: &[KeySchemaElement]) -> Result<Vec<sdk::KeySchemaElement>> {
    keys.iter()
        .map(|k| {
            sdk::KeySchemaElement::builder()
                .attribute_name(&k.attribute_name)
                .key_type(sdk::KeyType::from(k.key_type.as_str()))
                .build()
                .map_err(build_err)
        })
        .collect()
}

fn throughput_to_sdk(pt: &ProvisionedThroughput) -> Result<sdk::ProvisionedThroughput> {
    sdk::ProvisionedThroughput::builder()
        .read_capacity_units(pt.read_capacity_units)
        .write_capacity_units(pt.write_capacity_units)
        .build()
        .map_err(build_err)
}

/// Table creation parameters for an import, from a stored schema.
///
/// The import API cannot create local secondary indexes; they are dropped.
fn creation_parameters(schema: &TableSchema) -> Result<TableCreationParameters> {
    let attribute_definitions = schema
        .attribute_definitions
        .iter()
        .map(|a| {
            sdk::AttributeDefinition::builder()
                .attribute_name(&a.attribute_name)
                .attribute_type(sdk::ScalarAttributeType::from(a.attribute_type.as_str()))
                .build()
                .map_err(build_err)
        })
        .collect::<Result<Vec<_>>>()?;

    if let Some(lsis) = &schema.local_secondary_indexes {
        warn!(
            "Import cannot create local secondary indexes; skipping {} index(es) on {}",
            lsis.len(),
            schema.table_name
        );
    }

    let gsis = schema
        .global_secondary_indexes
        .iter()
        .flatten()
        .map(|gsi| {
            let projection = sdk::Projection::builder()
                .projection_type(sdk::ProjectionType::from(
                    gsi.projection.projection_type.as_str(),
                ))
                .set_non_key_attributes(
                    (!gsi.projection.non_key_attributes.is_empty())
                        .then(|| gsi.projection.non_key_attributes.clone()),
                )
                .build();

            sdk::GlobalSecondaryIndex::builder()
                .index_name(&gsi.index_name)
                .set_key_schema(Some(key_schema_to_sdk(&gsi.key_schema)?))
                .projection(projection)
                .set_provisioned_throughput(
                    gsi.provisioned_throughput
                        .as_ref()
                        .map(throughput_to_sdk)
                        .transpose()?,
                )
                .build()
                .map_err(build_err)
        })
        .collect::<Result<Vec<_>>>()?;

    TableCreationParameters::builder()
        .table_name(&schema.table_name)
        .set_attribute_definitions(Some(attribute_definitions))
        .set_key_schema(Some(key_schema_to_sdk(&schema.key_schema)?))
        .billing_mode(sdk::BillingMode::from(schema.billing_mode.as_str()))
        .set_provisioned_throughput(
            schema
                .provisioned_throughput
                .as_ref()
                .map(throughput_to_sdk)
                .transpose()?,
        )
        .set_global_secondary_indexes((!gsis.is_empty()).then_some(gsis))
        .build()
        .map_err(build_err)
}

fn import_job(operation: &str, desc: Option<&sdk::ImportTableDescription>) -> Result<ImportJob> {
    let desc = desc.ok_or_else(|| ProviderError::missing(operation, "ImportTableDescription"))?;

    // Item counters are plain or optional depending on the SDK release.
    let processed_item_count: Option<i64> = desc.processed_item_count().into();
    let imported_item_count: Option<i64> = desc.imported_item_count().into();

    Ok(ImportJob {
        import_arn: desc
            .import_arn()
            .ok_or_else(|| ProviderError::missing(operation, "ImportArn"))?
            .to_string(),
        status: desc
            .import_status()
            .map(|s| ImportStatus::parse(s.as_str()))
            .ok_or_else(|| ProviderError::missing(operation, "ImportStatus"))?,
        processed_item_count,
        imported_item_count,
        failure_message: desc.failure_message().map(str::to_string),
    })
}

#[async_trait]
impl TableService for DynamoDbService {
    async fn describe_table(&self, table: &str) -> Result<TableDetails> {
        let name = table_name_from_identifier(table);
        debug!("DescribeTable: {} ({})", name, self.region);

        let response = match self.client.describe_table().table_name(name).send().await {
            Ok(response) => response,
            Err(err) => {
                let not_found = err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception());
                if not_found {
                    return Err(Error::TableNotFound(format!("{} ({})", name, self.region)));
                }
                return Err(api_err("DescribeTable", err));
            }
        };

        let description = response
            .table()
            .ok_or_else(|| ProviderError::missing("DescribeTable", "Table"))?;

        let table_arn = description
            .table_arn()
            .ok_or_else(|| ProviderError::missing("DescribeTable", "TableArn"))?
            .to_string();

        Ok(TableDetails {
            table_arn,
            schema: schema_from_description(description)?,
        })
    }

    async fn export_table(&self, request: &ExportRequest) -> Result<ExportJob> {
        debug!(
            "ExportTableToPointInTime: {} -> s3://{}/{}",
            request.table_arn, request.bucket, request.prefix
        );

        let response = self
            .client
            .export_table_to_point_in_time()
            .table_arn(&request.table_arn)
            .s3_bucket(&request.bucket)
            .s3_prefix(&request.prefix)
            .export_format(ExportFormat::DynamodbJson)
            .s3_sse_algorithm(S3SseAlgorithm::Aes256)
            .send()
            .await
            .map_err(|e| api_err("ExportTableToPointInTime", e))?;

        let desc = response
            .export_description()
            .ok_or_else(|| ProviderError::missing("ExportTableToPointInTime", "ExportDescription"))?;

        Ok(ExportJob {
            export_arn: desc
                .export_arn()
                .ok_or_else(|| ProviderError::missing("ExportTableToPointInTime", "ExportArn"))?
                .to_string(),
            status: desc
                .export_status()
                .map(|s| ExportStatus::parse(s.as_str()))
                .unwrap_or(ExportStatus::InProgress),
            export_time: desc.export_time().and_then(to_utc),
        })
    }

    async fn list_exports(&self, table_arn: &str, limit: usize) -> Result<Vec<ExportJob>> {
        debug!("ListExports: {} (max {})", table_arn, limit);

        let response = self
            .client
            .list_exports()
            .table_arn(table_arn)
            .max_results(i32::try_from(limit).unwrap_or(i32::MAX))
            .send()
            .await
            .map_err(|e| api_err("ListExports", e))?;

        let mut jobs = Vec::new();
        for summary in response.export_summaries() {
            let Some(export_arn) = summary.export_arn() else {
                continue;
            };
            let status = summary
                .export_status()
                .map(|s| ExportStatus::parse(s.as_str()))
                .unwrap_or_else(|| ExportStatus::Other("UNKNOWN".to_string()));

            // Summaries carry no timestamp; the description does.
            let export_time = match self
                .client
                .describe_export()
                .export_arn(export_arn)
                .send()
                .await
            {
                Ok(described) => described
                    .export_description()
                    .and_then(|d| d.export_time())
                    .and_then(to_utc),
                Err(e) => {
                    warn!(
                        "DescribeExport failed for {}: {}",
                        export_arn,
                        DisplayErrorContext(&e)
                    );
                    None
                }
            };

            jobs.push(ExportJob {
                export_arn: export_arn.to_string(),
                status,
                export_time,
            });
        }

        jobs.sort_by(|a, b| b.export_time.cmp(&a.export_time));
        Ok(jobs)
    }

    async fn import_table(&self, request: &ImportRequest) -> Result<ImportJob> {
        debug!(
            "ImportTable: s3://{}/{} -> {}",
            request.bucket, request.data_prefix, request.schema.table_name
        );

        let source = S3BucketSource::builder()
            .s3_bucket(&request.bucket)
            .s3_key_prefix(&request.data_prefix)
            .build()
            .map_err(build_err)?;

        let response = self
            .client
            .import_table()
            .s3_bucket_source(source)
            .input_format(InputFormat::DynamodbJson)
            .table_creation_parameters(creation_parameters(&request.schema)?)
            .send()
            .await
            .map_err(|e| api_err("ImportTable", e))?;

        import_job("ImportTable", response.import_table_description())
    }

    async fn describe_import(&self, import_arn: &str) -> Result<ImportJob> {
        let response = self
            .client
            .describe_import()
            .import_arn(import_arn)
            .send()
            .await
            .map_err(|e| api_err("DescribeImport", e))?;

        import_job("DescribeImport", response.import_table_description())
    }
}

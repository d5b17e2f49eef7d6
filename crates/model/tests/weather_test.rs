//! Integration test assembling the weather service model

use smithy_semantic_model::knowledge::BindingType;
use smithy_semantic_model::{Model, ModelAssembler, Severity, ShapeId};
use smithy_semantic_parser::{parse_fragment, FragmentWriter};

const WEATHER: &str = r#"{
    "smithy": "2.0",
    "shapes": {
        "example.weather#Weather": {
            "type": "service",
            "version": "2006-03-01",
            "resources": [
                { "target": "example.weather#City" }
            ],
            "operations": [
                { "target": "example.weather#GetCurrentTime" }
            ],
            "traits": {
                "smithy.api#documentation": "Provides weather forecasts.",
                "aws.api#service": { "sdkId": "Weather", "arnNamespace": "weather" }
            }
        },
        "example.weather#City": {
            "type": "resource",
            "identifiers": {
                "cityId": { "target": "example.weather#CityId" }
            },
            "properties": {
                "name": { "target": "smithy.api#String" }
            },
            "read": { "target": "example.weather#GetCity" },
            "list": { "target": "example.weather#ListCities" },
            "resources": [
                { "target": "example.weather#Forecast" }
            ],
            "traits": {
                "aws.api#arn": { "template": "city/{cityId}" }
            }
        },
        "example.weather#CityId": {
            "type": "string",
            "traits": {
                "smithy.api#pattern": "^[A-Za-z0-9 ]+$"
            }
        },
        "example.weather#GetCity": {
            "type": "operation",
            "input": { "target": "example.weather#GetCityInput" },
            "output": { "target": "example.weather#GetCityOutput" },
            "errors": [
                { "target": "example.weather#NoSuchResource" }
            ],
            "traits": {
                "smithy.api#readonly": {},
                "smithy.api#http": { "method": "GET", "uri": "/cities/{cityId}" }
            }
        },
        "example.weather#GetCityInput": {
            "type": "structure",
            "for": { "target": "example.weather#City" },
            "members": {
                "cityId": {
                    "traits": {
                        "smithy.api#required": {},
                        "smithy.api#httpLabel": {}
                    }
                }
            },
            "traits": { "smithy.api#input": {} }
        },
        "example.weather#GetCityOutput": {
            "type": "structure",
            "for": { "target": "example.weather#City" },
            "members": {
                "name": {
                    "traits": { "smithy.api#required": {} }
                }
            },
            "traits": { "smithy.api#output": {} }
        },
        "example.weather#NoSuchResource": {
            "type": "structure",
            "members": {
                "resourceType": {
                    "target": "smithy.api#String",
                    "traits": { "smithy.api#required": {} }
                }
            },
            "traits": {
                "smithy.api#error": "client",
                "smithy.api#httpError": 404
            }
        },
        "example.weather#ListCities": {
            "type": "operation",
            "input": { "target": "example.weather#ListCitiesInput" },
            "output": { "target": "example.weather#ListCitiesOutput" },
            "traits": {
                "smithy.api#readonly": {},
                "smithy.api#http": { "method": "GET", "uri": "/cities" }
            }
        },
        "example.weather#ListCitiesInput": {
            "type": "structure",
            "members": {
                "nextToken": {
                    "target": "smithy.api#String",
                    "traits": { "smithy.api#httpQuery": "nextToken" }
                },
                "pageSize": {
                    "target": "smithy.api#Integer",
                    "traits": { "smithy.api#httpQuery": "pageSize" }
                }
            },
            "traits": { "smithy.api#input": {} }
        },
        "example.weather#ListCitiesOutput": {
            "type": "structure",
            "members": {
                "nextToken": { "target": "smithy.api#String" },
                "items": {
                    "target": "example.weather#CitySummaries",
                    "traits": { "smithy.api#required": {} }
                }
            },
            "traits": { "smithy.api#output": {} }
        },
        "example.weather#CitySummaries": {
            "type": "list",
            "member": { "target": "example.weather#CitySummary" }
        },
        "example.weather#CitySummary": {
            "type": "structure",
            "members": {
                "cityId": {
                    "target": "example.weather#CityId",
                    "traits": { "smithy.api#required": {} }
                },
                "name": {
                    "target": "smithy.api#String",
                    "traits": { "smithy.api#required": {} }
                }
            }
        },
        "example.weather#Forecast": {
            "type": "resource",
            "identifiers": {
                "cityId": { "target": "example.weather#CityId" }
            },
            "read": { "target": "example.weather#GetForecast" }
        },
        "example.weather#GetForecast": {
            "type": "operation",
            "input": { "target": "example.weather#GetForecastInput" },
            "output": { "target": "example.weather#GetForecastOutput" },
            "traits": {
                "smithy.api#readonly": {},
                "smithy.api#http": { "method": "GET", "uri": "/cities/{cityId}/forecast" }
            }
        },
        "example.weather#GetForecastInput": {
            "type": "structure",
            "members": {
                "cityId": {
                    "target": "example.weather#CityId",
                    "traits": {
                        "smithy.api#required": {},
                        "smithy.api#httpLabel": {}
                    }
                }
            },
            "traits": { "smithy.api#input": {} }
        },
        "example.weather#GetForecastOutput": {
            "type": "structure",
            "members": {
                "chanceOfRain": { "target": "smithy.api#Float" }
            },
            "traits": { "smithy.api#output": {} }
        },
        "example.weather#GetCurrentTime": {
            "type": "operation",
            "output": { "target": "example.weather#GetCurrentTimeOutput" },
            "traits": {
                "smithy.api#readonly": {},
                "smithy.api#http": { "method": "GET", "uri": "/current-time" }
            }
        },
        "example.weather#GetCurrentTimeOutput": {
            "type": "structure",
            "members": {
                "time": {
                    "target": "smithy.api#Timestamp",
                    "traits": { "smithy.api#required": {} }
                }
            },
            "traits": { "smithy.api#output": {} }
        }
    }
}"#;

fn id(value: &str) -> ShapeId {
    ShapeId::parse(value).unwrap()
}

fn assemble(json: &str) -> Model {
    let mut assembler = ModelAssembler::new();
    assembler.add_json(json, "weather.json").unwrap();
    match assembler.assemble() {
        Ok(validated) => validated.into_model(),
        Err(err) => panic!("weather model failed to assemble: {err}"),
    }
}

#[test]
fn test_weather_model_has_no_errors() {
    let mut assembler = ModelAssembler::new();
    assembler.add_json(WEATHER, "weather.json").unwrap();
    let validated = assembler.assemble().unwrap();

    assert_eq!(validated.events_at_least(Severity::Danger).count(), 0);
    assert!(validated.model().contains_shape(&id("example.weather#Weather")));
}

#[test]
fn test_elided_members_take_resource_targets() {
    let model = assemble(WEATHER);

    let city_id = model.get_shape(&id("example.weather#GetCityInput$cityId")).unwrap();
    assert_eq!(city_id.target, Some(id("example.weather#CityId")));
    assert!(city_id.has_trait("smithy.api#httpLabel"));

    let name = model.get_shape(&id("example.weather#GetCityOutput$name")).unwrap();
    assert_eq!(name.target, Some(id("smithy.api#String")));
}

#[test]
fn test_identifier_binding_classification() {
    let model = assemble(WEATHER);
    let bindings = model.identifier_binding_index();
    let city = id("example.weather#City");

    assert_eq!(bindings.binding_type(&city, &id("example.weather#GetCity")), BindingType::Instance);
    assert_eq!(
        bindings.binding_type(&city, &id("example.weather#ListCities")),
        BindingType::Collection
    );
    assert_eq!(
        bindings.binding_type(&id("example.weather#Forecast"), &id("example.weather#GetForecast")),
        BindingType::Instance
    );
    assert_eq!(
        bindings.binding_type(&city, &id("example.weather#GetCurrentTime")),
        BindingType::None
    );
}

#[test]
fn test_top_down_and_http_indices() {
    let model = assemble(WEATHER);
    let weather = id("example.weather#Weather");

    let resources: Vec<_> = model.top_down_index().contained_resources(&weather).cloned().collect();
    assert!(resources.contains(&id("example.weather#City")));
    assert!(resources.contains(&id("example.weather#Forecast")));

    let http = model.http_binding_index();
    let route = http.route(&id("example.weather#GetForecast")).unwrap();
    assert_eq!(route.method, "GET");
    assert_eq!(route.code, 200);
    assert_eq!(route.uri.to_string(), "/cities/{cityId}/forecast");
}

#[test]
fn test_effective_arns() {
    let model = assemble(WEATHER);
    let arns = model.arn_index();
    let weather = id("example.weather#Weather");
    let city = id("example.weather#City");

    let effective = arns
        .effective_operation_arn(&weather, &id("example.weather#GetCity"))
        .unwrap();
    assert_eq!(effective.resource, city);
    assert_eq!(
        arns.full_resource_arn_template(&weather, &city).unwrap(),
        "arn:{AWS::Partition}:weather:{AWS::Region}:{AWS::AccountId}:city/{cityId}"
    );
}

#[test]
fn test_round_trip_through_json_ast() {
    let model = assemble(WEATHER);
    let fragment = model.to_fragment("round-trip.json");
    let json = FragmentWriter::new(&fragment).to_json().unwrap();

    let mut assembler = ModelAssembler::new();
    assembler.add_fragment(parse_fragment(&json, "round-trip.json").unwrap());
    let reassembled = assembler.assemble().unwrap().into_model();

    assert_eq!(model, reassembled);
}

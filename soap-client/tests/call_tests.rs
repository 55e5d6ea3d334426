//! End-to-end tests for `SoapClient::call` against a mock control endpoint.

use mockito::Server;
use soap_client::{SoapClient, SoapError};
use std::net::TcpListener;

const RENDERING_CONTROL: &str = "urn:schemas-upnp-org:service:RenderingControl:1";

#[test]
fn test_call_returns_action_response() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/RenderingControl/Control")
        .match_header(
            "soapaction",
            "\"urn:schemas-upnp-org:service:RenderingControl:1#GetVolume\"",
        )
        .with_status(200)
        .with_header("content-type", "text/xml")
        .with_body(
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
                <s:Body>
                    <u:GetVolumeResponse xmlns:u="urn:schemas-upnp-org:service:RenderingControl:1">
                        <CurrentVolume>42</CurrentVolume>
                    </u:GetVolumeResponse>
                </s:Body>
            </s:Envelope>"#,
        )
        .create();

    let url = format!("{}/RenderingControl/Control", server.url());
    let response = SoapClient::new()
        .call(
            &url,
            RENDERING_CONTROL,
            "GetVolume",
            "<InstanceID>0</InstanceID><Channel>Master</Channel>",
        )
        .expect("GetVolume should succeed");

    mock.assert();
    let volume = response
        .get_child("CurrentVolume")
        .and_then(|v| v.get_text())
        .map(|t| t.to_string());
    assert_eq!(volume.as_deref(), Some("42"));
}

#[test]
fn test_call_maps_http_500_fault_body() {
    let mut server = Server::new();
    let _mock = server
        .mock("POST", "/ctl")
        .with_status(500)
        .with_body(
            r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
                <s:Body>
                    <s:Fault>
                        <faultcode>s:Client</faultcode>
                        <faultstring>UPnPError</faultstring>
                        <detail>
                            <UPnPError xmlns="urn:schemas-upnp-org:control-1-0">
                                <errorCode>401</errorCode>
                            </UPnPError>
                        </detail>
                    </s:Fault>
                </s:Body>
            </s:Envelope>"#,
        )
        .create();

    let url = format!("{}/ctl", server.url());
    let err = SoapClient::new()
        .call(&url, RENDERING_CONTROL, "GetVolume", "")
        .unwrap_err();

    assert!(matches!(err, SoapError::Fault(401)));
    assert!(!err.is_device_gone());
}

#[test]
fn test_call_to_closed_port_is_device_gone() {
    // Grab a free port, then release it so nothing is listening there
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let url = format!("http://127.0.0.1:{}/ctl", port);
    let err = SoapClient::new()
        .call(&url, RENDERING_CONTROL, "GetVolume", "")
        .unwrap_err();

    assert!(err.is_device_gone(), "expected device-gone error, got {:?}", err);
}
